use std::sync::Arc;

use color_eyre::eyre;

use souk_providers::embedding;
use souk_service::{Providers, SearchService};
use souk_storage::catalog::CatalogStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SearchService>,
}
impl AppState {
	pub fn new(config: souk_config::Config) -> color_eyre::Result<Self> {
		let catalog = CatalogStore::new(&config.storage.qdrant)?;
		let service = SearchService::new(config, catalog);

		Ok(Self { service: Arc::new(service) })
	}

	pub fn with_providers(
		config: souk_config::Config,
		providers: Providers,
	) -> color_eyre::Result<Self> {
		let catalog = CatalogStore::new(&config.storage.qdrant)?;
		let service = SearchService::with_providers(config, catalog, providers);

		Ok(Self { service: Arc::new(service) })
	}

	/// Startup checks. The embedding backend must serve vectors of the
	/// configured dimension and the store must answer; both handles are
	/// frozen afterwards and shared read-only across requests.
	pub async fn warm_up(&self) -> color_eyre::Result<()> {
		embedding::probe(&self.service.cfg.providers.embedding)
			.await
			.map_err(|err| eyre::eyre!("Embedding backend probe failed: {err}"))?;

		let ready = self
			.service
			.catalog
			.exists()
			.await
			.map_err(|err| eyre::eyre!("Catalog store is unreachable: {err}"))?;

		if ready {
			tracing::info!(collection = %self.service.catalog.collection, "Catalog collection ready.");
		} else {
			tracing::warn!(
				collection = %self.service.catalog.collection,
				"Catalog collection is missing; run souk-etl before serving queries."
			);
		}

		Ok(())
	}
}
