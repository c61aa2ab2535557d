use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use souk_domain::Product;

use crate::{Error, Result, SearchService};

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
	/// Drop and recreate the collection before loading (full rebuild).
	pub recreate: bool,
	pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
	pub product_id: i64,
	pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct IngestReport {
	pub total: usize,
	pub inserted: usize,
	pub failed: Vec<RecordFailure>,
	pub index_provisioned: bool,
}

impl SearchService {
	/// Runs the batch ingestion pipeline: schema, validate, embed, upsert,
	/// index. Failed records are reported individually, never dropped
	/// silently, and index provisioning happens only after every record was
	/// inserted; a run with failures leaves provisioning to the next run so
	/// the store is never half-indexed.
	pub async fn ingest(&self, records: Vec<Product>, opts: IngestOptions) -> Result<IngestReport> {
		if opts.batch_size == 0 {
			return Err(Error::InvalidQuery {
				message: "batch_size must be greater than zero.".to_string(),
			});
		}

		let mut report = IngestReport { total: records.len(), ..Default::default() };

		if opts.recreate && self.catalog.exists().await? {
			info!(collection = %self.catalog.collection, "Dropping catalog collection for a full rebuild.");
			self.catalog.drop_collection().await?;
		}

		self.catalog.ensure_collection().await?;

		let (valid, invalid) = validate_records(records);

		report.failed.extend(invalid);

		for batch in valid.chunks(opts.batch_size) {
			let texts: Vec<String> =
				batch.iter().map(|product| product.description.clone()).collect();
			let vectors = match self
				.providers
				.embedding
				.embed(&self.cfg.providers.embedding, &texts)
				.await
			{
				Ok(vectors) if vectors.len() == batch.len() => vectors,
				Ok(vectors) => {
					let reason = format!(
						"Embedding provider returned {} vectors for {} records.",
						vectors.len(),
						batch.len()
					);

					warn!(reason = %reason, "Embedding batch failed.");
					fail_batch(&mut report, batch, &reason);
					continue;
				},
				Err(err) => {
					warn!(error = %err, "Embedding batch failed.");
					fail_batch(&mut report, batch, &err.to_string());
					continue;
				},
			};

			match self.catalog.upsert_products(batch, &vectors).await {
				Ok(()) => report.inserted += batch.len(),
				// A dimension mismatch is a configuration error for the whole
				// run; it must never partially corrupt the stored data.
				Err(souk_storage::Error::DimensionMismatch { expected, actual }) =>
					return Err(Error::SchemaMismatch { expected, actual }),
				Err(err) => {
					warn!(error = %err, "Insert batch failed.");
					fail_batch(&mut report, batch, &err.to_string());
				},
			}
		}

		if report.failed.is_empty() {
			self.catalog.provision_indexes().await?;

			report.index_provisioned = true;
		} else {
			warn!(
				failed = report.failed.len(),
				"Skipping index provisioning; rerun ingestion after fixing the failed records."
			);
		}

		info!(
			total = report.total,
			inserted = report.inserted,
			failed = report.failed.len(),
			index_provisioned = report.index_provisioned,
			"Ingestion finished."
		);

		Ok(report)
	}
}

fn fail_batch(report: &mut IngestReport, batch: &[Product], reason: &str) {
	for product in batch {
		report.failed.push(RecordFailure {
			product_id: product.product_id,
			reason: reason.to_string(),
		});
	}
}

/// Per-record validation ahead of any store write. Later duplicates of an
/// id lose; the store would otherwise silently overwrite the earlier row.
fn validate_records(records: Vec<Product>) -> (Vec<Product>, Vec<RecordFailure>) {
	let mut seen = HashSet::new();
	let mut valid = Vec::with_capacity(records.len());
	let mut invalid = Vec::new();

	for product in records {
		let reason = if product.product_id < 0 {
			Some("product_id must be non-negative.".to_string())
		} else if !seen.insert(product.product_id) {
			Some("duplicate product_id within the batch.".to_string())
		} else if product.description.trim().is_empty() {
			Some("description must be non-empty.".to_string())
		} else if !product.price.is_finite() || product.price < 0.0 {
			Some("price must be zero or greater.".to_string())
		} else {
			None
		};

		match reason {
			Some(reason) => invalid.push(RecordFailure { product_id: product.product_id, reason }),
			None => valid.push(product),
		}
	}

	(valid, invalid)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn product(product_id: i64, price: f64) -> Product {
		Product {
			product_id,
			name: format!("Product {product_id}"),
			description: "A sturdy, waterproof product.".to_string(),
			category: "Outdoor".to_string(),
			price,
			in_stock: true,
			brand: "Brand".to_string(),
		}
	}

	#[test]
	fn valid_records_pass_through() {
		let (valid, invalid) = validate_records(vec![product(1, 10.0), product(2, 0.0)]);

		assert_eq!(valid.len(), 2);
		assert!(invalid.is_empty());
	}

	#[test]
	fn duplicate_ids_fail_after_the_first() {
		let (valid, invalid) = validate_records(vec![product(1, 10.0), product(1, 12.0)]);

		assert_eq!(valid.len(), 1);
		assert_eq!(invalid.len(), 1);
		assert_eq!(invalid[0].product_id, 1);
		assert!(invalid[0].reason.contains("duplicate"));
	}

	#[test]
	fn negative_prices_and_ids_fail() {
		let (valid, invalid) = validate_records(vec![product(-1, 10.0), product(2, -0.01)]);

		assert!(valid.is_empty());
		assert_eq!(invalid.len(), 2);
	}

	#[test]
	fn blank_descriptions_fail() {
		let mut record = product(5, 10.0);

		record.description = "   ".to_string();

		let (valid, invalid) = validate_records(vec![record]);

		assert!(valid.is_empty());
		assert_eq!(invalid[0].product_id, 5);
	}
}
