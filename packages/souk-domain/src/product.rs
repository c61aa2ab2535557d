use serde::{Deserialize, Serialize};

/// A catalog entry. `product_id` is the immutable primary key and
/// `description` is the text the stored embedding is derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
	pub product_id: i64,
	pub name: String,
	pub description: String,
	pub category: String,
	pub price: f64,
	pub in_stock: bool,
	pub brand: String,
}

/// Scalar constraints evaluated exactly alongside vector ranking. An absent
/// field imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
	pub max_price: Option<f64>,
	pub category: Option<String>,
	pub brand: Option<String>,
	pub in_stock_only: bool,
}
impl SearchFilters {
	pub fn is_empty(&self) -> bool {
		self.max_price.is_none()
			&& self.category.is_none()
			&& self.brand.is_none()
			&& !self.in_stock_only
	}

	/// Exact predicate check, used to re-verify store results defensively.
	pub fn matches(&self, product: &Product) -> bool {
		if let Some(max_price) = self.max_price
			&& product.price > max_price
		{
			return false;
		}
		if let Some(category) = self.category.as_deref()
			&& product.category != category
		{
			return false;
		}
		if let Some(brand) = self.brand.as_deref()
			&& product.brand != brand
		{
			return false;
		}
		if self.in_stock_only && !product.in_stock {
			return false;
		}

		true
	}
}
