use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Qdrant,
	client::Payload,
	qdrant::{
		CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollection, Distance,
		FieldType, HnswConfigDiffBuilder, PointStruct, Query, QueryPointsBuilder, ScoredPoint,
		UpsertPointsBuilder, Value, VectorParamsBuilder, point_id::PointIdOptions, value::Kind,
	},
};
use serde_json::Value as JsonValue;
use tracing::warn;

use souk_domain::{Product, SearchFilters};

use crate::{Error, Result, filter};

/// Payload fields indexed for exact predicate evaluation.
const PAYLOAD_INDEXES: [(&str, FieldType); 5] = [
	(filter::FIELD_PRODUCT_ID, FieldType::Integer),
	(filter::FIELD_CATEGORY, FieldType::Keyword),
	(filter::FIELD_BRAND, FieldType::Keyword),
	(filter::FIELD_PRICE, FieldType::Float),
	(filter::FIELD_IN_STOCK, FieldType::Bool),
];

/// A catalog record returned from a hybrid query, paired with its raw
/// distance under the collection's metric.
#[derive(Debug, Clone)]
pub struct ScoredHit {
	pub product: Product,
	pub distance: f32,
}

/// The sole owner of persisted catalog data. Point id = `product_id`, the
/// embedding is the point vector, and the scalar fields live in the payload.
pub struct CatalogStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
	pub index: souk_config::IndexParams,
}
impl CatalogStore {
	pub fn new(cfg: &souk_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url)
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
			.build()?;

		Ok(Self {
			client,
			collection: cfg.collection.clone(),
			vector_dim: cfg.vector_dim,
			index: cfg.index.clone(),
		})
	}

	/// Declares the catalog schema: a collection with vectors of the
	/// configured dimension ordered by L2 distance, plus the ANN graph
	/// parameters. Idempotent; an existing collection is left untouched.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(&self.collection).await? {
			return Ok(());
		}

		let create = CreateCollectionBuilder::new(self.collection.clone())
			.vectors_config(VectorParamsBuilder::new(
				u64::from(self.vector_dim),
				Distance::Euclid,
			))
			.hnsw_config(
				HnswConfigDiffBuilder::default()
					.m(self.index.hnsw_m)
					.ef_construct(self.index.ef_construct),
			);

		self.client.create_collection(create).await?;

		Ok(())
	}

	/// Provisions payload indexes for the scalar predicate fields. Safe to
	/// call repeatedly.
	pub async fn provision_indexes(&self) -> Result<()> {
		for (field_name, field_type) in PAYLOAD_INDEXES {
			let request = CreateFieldIndexCollection {
				collection_name: self.collection.clone(),
				wait: Some(true),
				field_name: field_name.to_string(),
				field_type: Some(field_type as i32),
				field_index_params: None,
				ordering: None,
			};

			self.client.create_field_index(request).await?;
		}

		Ok(())
	}

	pub async fn exists(&self) -> Result<bool> {
		Ok(self.client.collection_exists(&self.collection).await?)
	}

	pub async fn drop_collection(&self) -> Result<()> {
		self.client.delete_collection(self.collection.clone()).await?;

		Ok(())
	}

	pub async fn count(&self) -> Result<u64> {
		let response =
			self.client.count(CountPointsBuilder::new(self.collection.clone()).exact(true)).await?;

		Ok(response.result.map(|result| result.count).unwrap_or_default())
	}

	/// Appends or upserts catalog records keyed by `product_id`.
	pub async fn upsert_products(
		&self,
		products: &[Product],
		vectors: &[Vec<f32>],
	) -> Result<()> {
		if products.len() != vectors.len() {
			return Err(Error::InvalidArgument(format!(
				"Got {} products and {} vectors.",
				products.len(),
				vectors.len()
			)));
		}

		let mut points = Vec::with_capacity(products.len());

		for (product, vector) in products.iter().zip(vectors.iter()) {
			if vector.len() != self.vector_dim as usize {
				return Err(Error::DimensionMismatch {
					expected: self.vector_dim,
					actual: vector.len(),
				});
			}

			let mut payload_map = HashMap::new();

			payload_map
				.insert(filter::FIELD_PRODUCT_ID.to_string(), Value::from(product.product_id));
			payload_map.insert(filter::FIELD_NAME.to_string(), Value::from(product.name.clone()));
			payload_map.insert(
				filter::FIELD_DESCRIPTION.to_string(),
				Value::from(product.description.clone()),
			);
			payload_map
				.insert(filter::FIELD_CATEGORY.to_string(), Value::from(product.category.clone()));
			payload_map.insert(
				filter::FIELD_PRICE.to_string(),
				Value::from(JsonValue::from(product.price)),
			);
			payload_map.insert(filter::FIELD_IN_STOCK.to_string(), Value::from(product.in_stock));
			payload_map.insert(filter::FIELD_BRAND.to_string(), Value::from(product.brand.clone()));

			let payload = Payload::from(payload_map);
			let point = PointStruct::new(product.product_id as u64, vector.clone(), payload);

			points.push(point);
		}

		let upsert = UpsertPointsBuilder::new(self.collection.clone(), points).wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	/// Hybrid query: the nearest points to `vector` under the collection's
	/// metric among those matching `filters` exactly. Returns fewer than
	/// `limit` hits when fewer candidates satisfy the predicate; zero hits is
	/// success, not an error.
	pub async fn search(
		&self,
		vector: Vec<f32>,
		filters: &SearchFilters,
		limit: u64,
	) -> Result<Vec<ScoredHit>> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::DimensionMismatch {
				expected: self.vector_dim,
				actual: vector.len(),
			});
		}

		let query = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.filter(filter::build_filter(filters))
			.limit(limit)
			.with_payload(true);
		let response = self.client.query(query).await?;
		let mut hits = Vec::with_capacity(response.result.len());

		for point in &response.result {
			let Some(product) = decode_product(point) else {
				warn!(collection = %self.collection, "Skipping point with malformed catalog payload.");
				continue;
			};

			hits.push(ScoredHit { product, distance: point.score });
		}

		Ok(hits)
	}
}

fn decode_product(point: &ScoredPoint) -> Option<Product> {
	let payload = &point.payload;
	let product_id =
		payload_i64(payload, filter::FIELD_PRODUCT_ID).or_else(|| point_id_num(point))?;

	Some(Product {
		product_id,
		name: payload_str(payload, filter::FIELD_NAME)?,
		description: payload_str(payload, filter::FIELD_DESCRIPTION)?,
		category: payload_str(payload, filter::FIELD_CATEGORY)?,
		price: payload_f64(payload, filter::FIELD_PRICE)?,
		in_stock: payload_bool(payload, filter::FIELD_IN_STOCK)?,
		brand: payload_str(payload, filter::FIELD_BRAND)?,
	})
}

fn point_id_num(point: &ScoredPoint) -> Option<i64> {
	match point.id.as_ref()?.point_id_options.as_ref()? {
		PointIdOptions::Num(id) => i64::try_from(*id).ok(),
		PointIdOptions::Uuid(_) => None,
	}
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn payload_i64(payload: &HashMap<String, Value>, key: &str) -> Option<i64> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::IntegerValue(value)) => Some(*value),
		_ => None,
	}
}

fn payload_f64(payload: &HashMap<String, Value>, key: &str) -> Option<f64> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::DoubleValue(value)) => Some(*value),
		Some(Kind::IntegerValue(value)) => Some(*value as f64),
		_ => None,
	}
}

fn payload_bool(payload: &HashMap<String, Value>, key: &str) -> Option<bool> {
	let value = payload.get(key)?;
	match &value.kind {
		Some(Kind::BoolValue(value)) => Some(*value),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_payload() -> HashMap<String, Value> {
		let mut payload = HashMap::new();

		payload.insert(filter::FIELD_PRODUCT_ID.to_string(), Value::from(7_i64));
		payload.insert(filter::FIELD_NAME.to_string(), Value::from("Trail Pro".to_string()));
		payload.insert(
			filter::FIELD_DESCRIPTION.to_string(),
			Value::from("Lightweight trail shoe.".to_string()),
		);
		payload.insert(filter::FIELD_CATEGORY.to_string(), Value::from("Footwear".to_string()));
		payload.insert(filter::FIELD_PRICE.to_string(), Value::from(JsonValue::from(79.5)));
		payload.insert(filter::FIELD_IN_STOCK.to_string(), Value::from(true));
		payload.insert(filter::FIELD_BRAND.to_string(), Value::from("ActiveGear".to_string()));

		payload
	}

	#[test]
	fn decodes_a_complete_payload() {
		let point = ScoredPoint { payload: sample_payload(), score: 0.25, ..Default::default() };
		let product = decode_product(&point).expect("Expected a decoded product.");

		assert_eq!(product.product_id, 7);
		assert_eq!(product.name, "Trail Pro");
		assert_eq!(product.price, 79.5);
		assert!(product.in_stock);
	}

	#[test]
	fn integer_prices_decode_as_floats() {
		let mut payload = sample_payload();

		payload.insert(filter::FIELD_PRICE.to_string(), Value::from(80_i64));

		let point = ScoredPoint { payload, score: 0.0, ..Default::default() };
		let product = decode_product(&point).expect("Expected a decoded product.");

		assert_eq!(product.price, 80.0);
	}

	#[test]
	fn malformed_payloads_are_rejected() {
		let mut payload = sample_payload();

		payload.remove(filter::FIELD_BRAND);

		let point = ScoredPoint { payload, score: 0.0, ..Default::default() };

		assert!(decode_product(&point).is_none());
	}
}
