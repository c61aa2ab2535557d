use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub search: Search,
	pub ingest: Option<Ingest>,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
	#[serde(default = "default_store_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_store_connect_timeout_ms")]
	pub connect_timeout_ms: u64,
	#[serde(default)]
	pub index: IndexParams,
}

/// ANN index tuning for the catalog collection. The graph parameters trade
/// recall for speed without changing result semantics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexParams {
	pub hnsw_m: u64,
	pub ef_construct: u64,
}
impl Default for IndexParams {
	fn default() -> Self {
		Self { hnsw_m: 16, ef_construct: 128 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_top_k: u32,
	pub max_top_k: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self { default_top_k: 5, max_top_k: 20 }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ingest {
	pub products_file: PathBuf,
	#[serde(default = "default_batch_size")]
	pub batch_size: usize,
}

fn default_store_timeout_ms() -> u64 {
	5_000
}

fn default_store_connect_timeout_ms() -> u64 {
	2_000
}

fn default_batch_size() -> usize {
	32
}
