use serde::{Deserialize, Serialize};
use tracing::info;

use souk_domain::{SearchFilters, relevance};
use souk_storage::catalog::ScoredHit;

use crate::{Error, Result, SearchService};

/// One search invocation, built by the protocol layer and discarded after
/// the response is produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	pub top_k: Option<u32>,
	pub max_price: Option<f64>,
	pub category: Option<String>,
	pub in_stock_only: Option<bool>,
	pub brand: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMatch {
	pub product_id: i64,
	pub name: String,
	pub category: String,
	pub description: String,
	pub price: f64,
	pub in_stock: bool,
	pub brand: String,
	/// Display relevance in (0, 100], rounded to one decimal place.
	pub relevance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
	pub query: String,
	pub total_results: usize,
	pub products: Vec<ProductMatch>,
}

impl SearchService {
	pub async fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		if req.query.trim().is_empty() {
			return Err(Error::InvalidQuery { message: "query must be non-empty.".to_string() });
		}

		let top_k = req.top_k.unwrap_or(self.cfg.search.default_top_k);

		if top_k == 0 {
			return Err(Error::InvalidQuery {
				message: "top_k must be greater than zero.".to_string(),
			});
		}
		if top_k > self.cfg.search.max_top_k {
			return Err(Error::InvalidQuery {
				message: format!("top_k must be at most {}.", self.cfg.search.max_top_k),
			});
		}
		if let Some(max_price) = req.max_price
			&& (!max_price.is_finite() || max_price < 0.0)
		{
			return Err(Error::InvalidQuery {
				message: "max_price must be zero or greater.".to_string(),
			});
		}

		let filters = SearchFilters {
			max_price: req.max_price,
			category: req.category.clone(),
			brand: req.brand.clone(),
			in_stock_only: req.in_stock_only.unwrap_or(false),
		};
		let query_vector = self.embed_one(req.query.trim()).await?;
		let mut hits = self.catalog.search(query_vector, &filters, u64::from(top_k)).await?;

		// The store already bounds the result, but ordering and truncation are
		// re-enforced here so the response contract never depends on it.
		rank_hits(&mut hits, top_k as usize);

		let products: Vec<ProductMatch> = hits.into_iter().map(to_match).collect();

		info!(query = %req.query, results = products.len(), "Search completed.");

		Ok(SearchResponse { query: req.query, total_results: products.len(), products })
	}
}

/// Distance ascending is relevance descending; ids break exact ties so the
/// ordering stays deterministic.
fn rank_hits(hits: &mut Vec<ScoredHit>, top_k: usize) {
	hits.sort_by(|a, b| {
		a.distance
			.partial_cmp(&b.distance)
			.unwrap_or(std::cmp::Ordering::Equal)
			.then_with(|| a.product.product_id.cmp(&b.product.product_id))
	});
	hits.truncate(top_k);
}

fn to_match(hit: ScoredHit) -> ProductMatch {
	let ScoredHit { product, distance } = hit;

	ProductMatch {
		product_id: product.product_id,
		name: product.name,
		category: product.category,
		description: product.description,
		price: product.price,
		in_stock: product.in_stock,
		brand: product.brand,
		relevance: relevance::rounded(distance),
	}
}
