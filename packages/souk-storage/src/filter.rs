use qdrant_client::qdrant::{Condition, Filter, Range};

use souk_domain::SearchFilters;

/// Payload field names of a catalog point. The field layout is the durable
/// contract between ingestion and search.
pub const FIELD_PRODUCT_ID: &str = "product_id";
pub const FIELD_NAME: &str = "name";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_CATEGORY: &str = "category";
pub const FIELD_PRICE: &str = "price";
pub const FIELD_IN_STOCK: &str = "in_stock";
pub const FIELD_BRAND: &str = "brand";

/// Builds the exact scalar predicate of a hybrid query. Every supplied
/// filter contributes one `must` condition; an omitted filter imposes no
/// constraint.
pub fn build_filter(filters: &SearchFilters) -> Filter {
	let mut must = Vec::new();

	if let Some(max_price) = filters.max_price {
		must.push(Condition::range(
			FIELD_PRICE,
			Range { lte: Some(max_price), ..Default::default() },
		));
	}
	if let Some(category) = filters.category.as_ref() {
		must.push(Condition::matches(FIELD_CATEGORY, category.clone()));
	}
	if let Some(brand) = filters.brand.as_ref() {
		must.push(Condition::matches(FIELD_BRAND, brand.clone()));
	}
	if filters.in_stock_only {
		must.push(Condition::matches(FIELD_IN_STOCK, true));
	}

	Filter { must, ..Default::default() }
}
