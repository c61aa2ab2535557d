use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use serde_json::Map;

use souk_config::{
	Config, EmbeddingProviderConfig, IndexParams, Qdrant, Search, Service, Storage,
};
use souk_service::{BoxFuture, EmbeddingProvider, Error, Providers, SearchRequest, SearchService};
use souk_storage::catalog::CatalogStore;

const VECTOR_DIM: u32 = 8;

/// Embedding stub that counts invocations; used to prove that validation
/// failures never reach the embedding backend.
struct SpyEmbedding {
	dimensions: u32,
	calls: Arc<AtomicUsize>,
}
impl EmbeddingProvider for SpyEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, souk_providers::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let dim = self.dimensions as usize;
		let vectors = texts.iter().map(|_| vec![0.0; dim]).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			qdrant: Qdrant {
				// A closed port: reachable code paths fail fast instead of
				// hanging, and nothing here ever answers.
				url: "http://127.0.0.1:1".to_string(),
				collection: "souk_service_test".to_string(),
				vector_dim: VECTOR_DIM,
				timeout_ms: 1_000,
				connect_timeout_ms: 200,
				index: IndexParams::default(),
			},
		},
		providers: souk_config::Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:1".to_string(),
				api_key: "test-key".to_string(),
				path: "/".to_string(),
				model: "test".to_string(),
				dimensions: VECTOR_DIM,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		search: Search { default_top_k: 5, max_top_k: 20 },
		ingest: None,
	}
}

fn service_with_spy(dimensions: u32) -> (SearchService, Arc<AtomicUsize>) {
	let calls = Arc::new(AtomicUsize::new(0));
	let providers =
		Providers::new(Arc::new(SpyEmbedding { dimensions, calls: calls.clone() }));
	let config = test_config();
	let catalog = CatalogStore::new(&config.storage.qdrant).expect("Failed to build store.");
	let service = SearchService::with_providers(config, catalog, providers);

	(service, calls)
}

fn request(query: &str) -> SearchRequest {
	SearchRequest {
		query: query.to_string(),
		top_k: None,
		max_price: None,
		category: None,
		in_stock_only: None,
		brand: None,
	}
}

#[tokio::test]
async fn blank_query_is_rejected_before_embedding() {
	let (service, calls) = service_with_spy(VECTOR_DIM);
	let result = service.search(request("   ")).await;

	assert!(matches!(result, Err(Error::InvalidQuery { .. })), "got {result:?}");
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_top_k_is_rejected_before_embedding() {
	let (service, calls) = service_with_spy(VECTOR_DIM);
	let mut req = request("running shoes");

	req.top_k = Some(0);

	let result = service.search(req).await;

	assert!(matches!(result, Err(Error::InvalidQuery { .. })), "got {result:?}");
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn top_k_above_the_maximum_is_rejected() {
	let (service, calls) = service_with_spy(VECTOR_DIM);
	let mut req = request("running shoes");

	req.top_k = Some(21);

	let result = service.search(req).await;

	assert!(matches!(result, Err(Error::InvalidQuery { .. })), "got {result:?}");
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn negative_max_price_is_rejected_before_embedding() {
	let (service, calls) = service_with_spy(VECTOR_DIM);
	let mut req = request("running shoes");

	req.max_price = Some(-1.0);

	let result = service.search(req).await;

	assert!(matches!(result, Err(Error::InvalidQuery { .. })), "got {result:?}");
	assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wrong_embedding_dimension_is_a_schema_mismatch() {
	let (service, calls) = service_with_spy(VECTOR_DIM + 1);
	let result = service.search(request("running shoes")).await;

	assert!(matches!(result, Err(Error::SchemaMismatch { .. })), "got {result:?}");
	assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_store_surfaces_as_store_unavailable() {
	let (service, _calls) = service_with_spy(VECTOR_DIM);
	let result = service.search(request("running shoes")).await;

	assert!(matches!(result, Err(Error::StoreUnavailable { .. })), "got {result:?}");
}
