pub mod ingest;
pub mod search;

mod error;

pub use error::{Error, Result};
pub use ingest::{IngestOptions, IngestReport, RecordFailure};
pub use search::{ProductMatch, SearchRequest, SearchResponse};

use std::{future::Future, pin::Pin, sync::Arc};

use souk_config::{Config, EmbeddingProviderConfig};
use souk_providers::embedding;
use souk_storage::catalog::CatalogStore;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The query-embedding seam. The default implementation calls the remote
/// provider; tests substitute deterministic stubs.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, souk_providers::Result<Vec<Vec<f32>>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, souk_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}

impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

/// Stateless search executor. Holds only the read-only handles initialized
/// at process startup; every call is independent.
pub struct SearchService {
	pub cfg: Config,
	pub catalog: CatalogStore,
	pub providers: Providers,
}
impl SearchService {
	pub fn new(cfg: Config, catalog: CatalogStore) -> Self {
		Self { cfg, catalog, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, catalog: CatalogStore, providers: Providers) -> Self {
		Self { cfg, catalog, providers }
	}

	pub(crate) async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
		let vectors = self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, std::slice::from_ref(&text.to_string()))
			.await?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(Error::ModelUnavailable {
				message: "Embedding provider returned no vectors.".to_string(),
			});
		};

		if vector.len() != self.cfg.storage.qdrant.vector_dim as usize {
			return Err(Error::SchemaMismatch {
				expected: self.cfg.storage.qdrant.vector_dim,
				actual: vector.len(),
			});
		}

		Ok(vector)
	}
}
