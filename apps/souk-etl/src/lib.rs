//! Batch ingestion pipeline: read the product feed, embed every
//! description, upsert the records into the catalog store, and provision
//! the index. Runs to completion before any query traffic is meaningful.

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use souk_domain::Product;
use souk_providers::embedding;
use souk_service::{IngestOptions, SearchService};
use souk_storage::catalog::CatalogStore;

#[derive(Debug, Parser)]
#[command(
	version = souk_cli::VERSION,
	rename_all = "kebab",
	styles = souk_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Drop and recreate the catalog collection before loading.
	#[arg(long)]
	pub recreate: bool,
}

pub async fn run(args: Args) -> Result<()> {
	let config = souk_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let ingest_cfg = config
		.ingest
		.clone()
		.ok_or_else(|| eyre::eyre!("ingest section is required for souk-etl."))?;

	embedding::probe(&config.providers.embedding)
		.await
		.map_err(|err| eyre::eyre!("Embedding backend probe failed: {err}"))?;

	let records = load_products(&ingest_cfg.products_file)?;

	tracing::info!(
		count = records.len(),
		file = %ingest_cfg.products_file.display(),
		"Loaded product records."
	);

	let catalog = CatalogStore::new(&config.storage.qdrant)?;
	let service = SearchService::new(config, catalog);
	let report = service
		.ingest(
			records,
			IngestOptions { recreate: args.recreate, batch_size: ingest_cfg.batch_size },
		)
		.await?;

	for failure in &report.failed {
		tracing::error!(
			product_id = failure.product_id,
			reason = %failure.reason,
			"Record failed."
		);
	}

	let count = service.catalog.count().await.unwrap_or_default();

	tracing::info!(
		total = report.total,
		inserted = report.inserted,
		failed = report.failed.len(),
		index_provisioned = report.index_provisioned,
		stored = count,
		"Ingestion report."
	);

	if !report.failed.is_empty() {
		return Err(eyre::eyre!(
			"{} of {} records failed; index provisioning deferred to the next run.",
			report.failed.len(),
			report.total
		));
	}

	Ok(())
}

fn load_products(path: &Path) -> Result<Vec<Product>> {
	let raw = std::fs::read_to_string(path)
		.map_err(|err| eyre::eyre!("Failed to read products file {}: {err}", path.display()))?;
	let records: Vec<Product> = serde_json::from_str(&raw)
		.map_err(|err| eyre::eyre!("Failed to parse products file {}: {err}", path.display()))?;

	Ok(records)
}

#[cfg(test)]
mod tests {
	use std::{
		env, fs,
		time::{SystemTime, UNIX_EPOCH},
	};

	use super::*;

	#[test]
	fn parses_a_product_feed() {
		let nanos = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_nanos())
			.unwrap_or_default();
		let path =
			env::temp_dir().join(format!("souk_etl_test_{}_{nanos}.json", std::process::id()));
		let feed = r#"[
			{
				"product_id": 1,
				"name": "StormRunner X5",
				"description": "Waterproof trail running shoes.",
				"category": "Footwear",
				"price": 89.99,
				"in_stock": true,
				"brand": "ActiveGear"
			}
		]"#;

		fs::write(&path, feed).expect("Failed to write feed.");

		let records = load_products(&path).expect("Failed to load feed.");

		let _ = fs::remove_file(&path);

		assert_eq!(records.len(), 1);
		assert_eq!(records[0].product_id, 1);
		assert_eq!(records[0].brand, "ActiveGear");
	}

	#[test]
	fn a_malformed_feed_is_an_error() {
		let nanos = SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map(|d| d.as_nanos())
			.unwrap_or_default();
		let path =
			env::temp_dir().join(format!("souk_etl_bad_{}_{nanos}.json", std::process::id()));

		fs::write(&path, "{\"not\": \"a list\"}").expect("Failed to write feed.");

		let result = load_products(&path);

		let _ = fs::remove_file(&path);

		assert!(result.is_err());
	}
}
