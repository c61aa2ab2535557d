//! The `search_products` tool: its static descriptor and the typed argument
//! parser. Arguments are validated once here, at the protocol boundary;
//! nothing untyped flows deeper into the system.

use serde_json::{Map, Value};

use souk_service::{SearchRequest, SearchResponse};

use crate::rpc::{INVALID_PARAMS, RpcError};

pub const TOOL_NAME: &str = "search_products";

const TOOL_DESCRIPTION: &str = "Semantic search for e-commerce products. Understands natural \
	language queries (e.g., 'waterproof running shoes under 100 euros') and returns ranked \
	results with relevance scores. Supports optional filtering by price, category, brand, and \
	stock availability. Use this tool when customers want to find, search, browse, or get \
	recommendations for products.";

/// The static `tools/list` payload. Deterministic; callers may byte-compare
/// successive responses.
pub fn list_result() -> Value {
	serde_json::json!({
		"tools": [{
			"name": TOOL_NAME,
			"description": TOOL_DESCRIPTION,
			"inputSchema": {
				"type": "object",
				"additionalProperties": false,
				"properties": {
					"query": {
						"type": "string",
						"description": "Natural language description of the desired product"
					},
					"top_k": {
						"type": "integer",
						"description": "Maximum number of results to return (1-20)",
						"default": 5
					},
					"max_price": {
						"type": "number",
						"description": "Maximum price in EUR (optional filter)"
					},
					"category": {
						"type": "string",
						"description": "Product category to filter by",
						"enum": ["Footwear", "Clothing", "Electronics", "Accessories", "Outdoor"]
					},
					"in_stock_only": {
						"type": "boolean",
						"description": "If true, return only products currently in stock",
						"default": false
					},
					"brand": {
						"type": "string",
						"description": "Brand name to filter by (e.g., 'ActiveGear')"
					}
				},
				"required": ["query"]
			}
		}]
	})
}

/// Validates `params.arguments` against the declared schema and produces the
/// typed request. Unknown keys are rejected so schema drift surfaces at the
/// caller instead of being ignored.
pub fn parse_arguments(arguments: Value) -> Result<SearchRequest, RpcError> {
	let Value::Object(mut map) = arguments else {
		return Err(invalid("params.arguments must be an object."));
	};

	let query = take_required_string(&mut map, "query")?;
	let top_k = take_optional_positive_int(&mut map, "top_k")?;
	let max_price = take_optional_number(&mut map, "max_price")?;
	let category = take_optional_string(&mut map, "category")?;
	let in_stock_only = take_optional_bool(&mut map, "in_stock_only")?;
	let brand = take_optional_string(&mut map, "brand")?;

	if let Some((key, _)) = map.into_iter().next() {
		return Err(invalid(format!("Unknown argument: {key}.")));
	}

	Ok(SearchRequest { query, top_k, max_price, category, in_stock_only, brand })
}

/// Serializes a search response into the tool content envelope: a single
/// text payload carrying the pretty-printed result object, relevance
/// formatted as a percentage string.
pub fn call_result(response: &SearchResponse) -> Value {
	let products: Vec<Value> = response
		.products
		.iter()
		.map(|product| {
			serde_json::json!({
				"product_id": product.product_id,
				"name": product.name,
				"category": product.category,
				"description": product.description,
				"price": product.price,
				"in_stock": product.in_stock,
				"brand": product.brand,
				"relevance": format!("{:.1}%", product.relevance),
			})
		})
		.collect();
	let payload = serde_json::json!({
		"query": response.query,
		"total_results": response.total_results,
		"products": products,
	});
	let text = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());

	serde_json::json!({
		"content": [{ "type": "text", "text": text }]
	})
}

fn invalid(message: impl Into<String>) -> RpcError {
	RpcError { code: INVALID_PARAMS, message: message.into() }
}

fn take_required_string(map: &mut Map<String, Value>, key: &str) -> Result<String, RpcError> {
	let value = map.remove(key).ok_or_else(|| invalid(format!("{key} is required.")))?;
	let Value::String(text) = value else {
		return Err(invalid(format!("{key} must be a string.")));
	};

	if text.trim().is_empty() {
		return Err(invalid(format!("{key} must be non-empty.")));
	}

	Ok(text)
}

fn take_optional_string(
	map: &mut Map<String, Value>,
	key: &str,
) -> Result<Option<String>, RpcError> {
	match map.remove(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::String(text)) => {
			if text.trim().is_empty() {
				return Err(invalid(format!("{key} must be non-empty.")));
			}

			Ok(Some(text))
		},
		Some(_) => Err(invalid(format!("{key} must be a string."))),
	}
}

fn take_optional_positive_int(
	map: &mut Map<String, Value>,
	key: &str,
) -> Result<Option<u32>, RpcError> {
	match map.remove(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Number(number)) => {
			let Some(value) = number.as_i64() else {
				return Err(invalid(format!("{key} must be an integer.")));
			};
			let value = u32::try_from(value)
				.ok()
				.filter(|value| *value > 0)
				.ok_or_else(|| invalid(format!("{key} must be a positive integer.")))?;

			Ok(Some(value))
		},
		Some(_) => Err(invalid(format!("{key} must be an integer."))),
	}
}

fn take_optional_number(map: &mut Map<String, Value>, key: &str) -> Result<Option<f64>, RpcError> {
	match map.remove(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Number(number)) => {
			let Some(value) = number.as_f64() else {
				return Err(invalid(format!("{key} must be a number.")));
			};

			Ok(Some(value))
		},
		Some(_) => Err(invalid(format!("{key} must be a number."))),
	}
}

fn take_optional_bool(map: &mut Map<String, Value>, key: &str) -> Result<Option<bool>, RpcError> {
	match map.remove(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Bool(value)) => Ok(Some(value)),
		Some(_) => Err(invalid(format!("{key} must be a boolean."))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn arguments(raw: Value) -> Result<SearchRequest, RpcError> {
		parse_arguments(raw)
	}

	#[test]
	fn full_argument_set_parses() {
		let request = arguments(serde_json::json!({
			"query": "waterproof running shoes",
			"top_k": 3,
			"max_price": 100.0,
			"category": "Footwear",
			"in_stock_only": true,
			"brand": "ActiveGear"
		}))
		.expect("Expected valid arguments.");

		assert_eq!(request.query, "waterproof running shoes");
		assert_eq!(request.top_k, Some(3));
		assert_eq!(request.max_price, Some(100.0));
		assert_eq!(request.category.as_deref(), Some("Footwear"));
		assert_eq!(request.in_stock_only, Some(true));
		assert_eq!(request.brand.as_deref(), Some("ActiveGear"));
	}

	#[test]
	fn missing_query_is_invalid() {
		let err = arguments(serde_json::json!({ "top_k": 3 })).expect_err("Expected an error.");

		assert_eq!(err.code, INVALID_PARAMS);
		assert!(err.message.contains("query"));
	}

	#[test]
	fn non_string_query_is_invalid() {
		let err = arguments(serde_json::json!({ "query": 42 })).expect_err("Expected an error.");

		assert_eq!(err.code, INVALID_PARAMS);
	}

	#[test]
	fn zero_or_fractional_top_k_is_invalid() {
		for top_k in [serde_json::json!(0), serde_json::json!(-3), serde_json::json!(2.5)] {
			let err = arguments(serde_json::json!({ "query": "shoes", "top_k": top_k }))
				.expect_err("Expected an error.");

			assert_eq!(err.code, INVALID_PARAMS);
		}
	}

	#[test]
	fn null_optionals_mean_no_constraint() {
		let request = arguments(serde_json::json!({
			"query": "shoes",
			"max_price": null,
			"category": null,
			"brand": null,
			"in_stock_only": null,
			"top_k": null
		}))
		.expect("Expected valid arguments.");

		assert_eq!(request.top_k, None);
		assert_eq!(request.max_price, None);
		assert_eq!(request.category, None);
		assert_eq!(request.in_stock_only, None);
		assert_eq!(request.brand, None);
	}

	#[test]
	fn unknown_arguments_are_rejected() {
		let err = arguments(serde_json::json!({ "query": "shoes", "color": "red" }))
			.expect_err("Expected an error.");

		assert_eq!(err.code, INVALID_PARAMS);
		assert!(err.message.contains("color"));
	}

	#[test]
	fn tool_descriptor_is_stable() {
		let first = serde_json::to_string(&list_result()).expect("Failed to serialize.");
		let second = serde_json::to_string(&list_result()).expect("Failed to serialize.");

		assert_eq!(first, second);
	}

	#[test]
	fn call_result_formats_relevance_as_a_percentage() {
		let response = SearchResponse {
			query: "waterproof running shoes".to_string(),
			total_results: 1,
			products: vec![souk_service::ProductMatch {
				product_id: 1,
				name: "StormRunner X5".to_string(),
				category: "Footwear".to_string(),
				description: "Waterproof trail running shoes.".to_string(),
				price: 89.99,
				in_stock: true,
				brand: "ActiveGear".to_string(),
				relevance: 92.3,
			}],
		};
		let result = call_result(&response);
		let text = result["content"][0]["text"].as_str().expect("Expected a text payload.");
		let parsed: Value = serde_json::from_str(text).expect("Payload must be JSON.");

		assert_eq!(result["content"][0]["type"], "text");
		assert_eq!(parsed["total_results"], 1);
		assert_eq!(parsed["products"][0]["relevance"], "92.3%");
		assert_eq!(parsed["query"], "waterproof running shoes");
	}
}
