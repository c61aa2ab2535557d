mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Ingest, IndexParams, Providers, Qdrant, Search, Service,
	Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.timeout_ms == 0 || cfg.storage.qdrant.connect_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant timeouts must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.index.hnsw_m == 0 || cfg.storage.qdrant.index.ef_construct == 0 {
		return Err(Error::Validation {
			message: "storage.qdrant.index parameters must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	// The embedder and the store must agree on the vector dimension at all
	// times; a mismatch is a fatal configuration error, never a silent
	// truncation or padding.
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_top_k == 0 {
		return Err(Error::Validation {
			message: "search.default_top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_top_k < cfg.search.default_top_k {
		return Err(Error::Validation {
			message: "search.max_top_k must be at least search.default_top_k.".to_string(),
		});
	}
	if let Some(ingest) = cfg.ingest.as_ref() {
		if ingest.products_file.as_os_str().is_empty() {
			return Err(Error::Validation {
				message: "ingest.products_file must be non-empty.".to_string(),
			});
		}
		if ingest.batch_size == 0 {
			return Err(Error::Validation {
				message: "ingest.batch_size must be greater than zero.".to_string(),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	// The embedding URL is formed by concatenating api_base and path; strip a
	// trailing slash so both "https://host" and "https://host/" work.
	while cfg.providers.embedding.api_base.ends_with('/') {
		cfg.providers.embedding.api_base.pop();
	}
	if !cfg.providers.embedding.path.starts_with('/') {
		cfg.providers.embedding.path.insert(0, '/');
	}
}
