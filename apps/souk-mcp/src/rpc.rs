//! JSON-RPC 2.0 envelope handling for the tool surface.
//!
//! Every request is independent; the only state behind the dispatcher is the
//! read-only service handle. Error objects carry a stable code and a short
//! human-readable summary; backend detail stays in the server log.

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use souk_service::Error as ServiceError;

use crate::{state::AppState, tools};

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
/// Server-defined: `tools/call` named a tool this server does not expose.
pub const TOOL_NOT_FOUND: i64 = -32001;
/// Server-defined: the embedding backend or the catalog store did not
/// answer. The call is retryable.
pub const UPSTREAM_UNAVAILABLE: i64 = -32002;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "souk-mcp";

#[derive(Debug, Deserialize)]
struct RpcRequest {
	jsonrpc: String,
	#[serde(default)]
	id: Value,
	method: String,
	#[serde(default)]
	params: Value,
}

#[derive(Debug)]
pub struct RpcError {
	pub code: i64,
	pub message: String,
}
impl RpcError {
	fn new(code: i64, message: impl Into<String>) -> Self {
		Self { code, message: message.into() }
	}
}

pub async fn handle(state: &AppState, body: &str) -> Value {
	let request: RpcRequest = match serde_json::from_str(body) {
		Ok(request) => request,
		Err(_) => return error_envelope(Value::Null, PARSE_ERROR, "Invalid JSON payload."),
	};

	if request.jsonrpc != "2.0" {
		return error_envelope(request.id, INVALID_REQUEST, "jsonrpc must be \"2.0\".");
	}

	info!(method = %request.method, "MCP request received.");

	let RpcRequest { id, method, params, .. } = request;

	match method.as_str() {
		"initialize" => result_envelope(id, initialize_result()),
		"notifications/initialized" => result_envelope(id, Value::Bool(true)),
		"ping" => result_envelope(id, serde_json::json!({})),
		"tools/list" => result_envelope(id, tools::list_result()),
		"tools/call" => match call_tool(state, params).await {
			Ok(result) => result_envelope(id, result),
			Err(err) => error_envelope(id, err.code, err.message),
		},
		_ => error_envelope(id, METHOD_NOT_FOUND, "Method not found."),
	}
}

async fn call_tool(state: &AppState, params: Value) -> Result<Value, RpcError> {
	let name = params
		.get("name")
		.and_then(Value::as_str)
		.ok_or_else(|| RpcError::new(INVALID_PARAMS, "params.name is required."))?;

	if name != tools::TOOL_NAME {
		return Err(RpcError::new(TOOL_NOT_FOUND, format!("Unknown tool: {name}.")));
	}

	let arguments = params
		.get("arguments")
		.cloned()
		.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
	let request = tools::parse_arguments(arguments)?;
	let response = match state.service.search(request).await {
		Ok(response) => response,
		Err(err) => return Err(map_service_error(err)),
	};

	Ok(tools::call_result(&response))
}

/// Maps internal failures onto the protocol taxonomy. Client-caused errors
/// keep their message; backend and internal failures return a stable summary
/// and log the detail server-side instead.
fn map_service_error(err: ServiceError) -> RpcError {
	match err {
		ServiceError::InvalidQuery { message } => RpcError::new(INVALID_PARAMS, message),
		ServiceError::ModelUnavailable { .. } => {
			error!(error = %err, "Embedding backend failed during a tool call.");

			RpcError::new(UPSTREAM_UNAVAILABLE, "Embedding backend unavailable; retry later.")
		},
		ServiceError::StoreUnavailable { .. } => {
			error!(error = %err, "Catalog store failed during a tool call.");

			RpcError::new(UPSTREAM_UNAVAILABLE, "Catalog store unavailable; retry later.")
		},
		ServiceError::SchemaMismatch { .. } => {
			error!(error = %err, "Schema mismatch during a tool call.");

			RpcError::new(INTERNAL_ERROR, "Internal error.")
		},
	}
}

fn initialize_result() -> Value {
	serde_json::json!({
		"protocolVersion": PROTOCOL_VERSION,
		"capabilities": { "tools": {} },
		"serverInfo": { "name": SERVER_NAME, "version": souk_cli::VERSION },
	})
}

fn result_envelope(id: Value, result: Value) -> Value {
	serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_envelope(id: Value, code: i64, message: impl Into<String>) -> Value {
	serde_json::json!({
		"jsonrpc": "2.0",
		"id": id,
		"error": { "code": code, "message": message.into() },
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn error_envelopes_never_carry_a_result() {
		let envelope = error_envelope(Value::from("req-1"), TOOL_NOT_FOUND, "Unknown tool: x.");

		assert_eq!(envelope["jsonrpc"], "2.0");
		assert_eq!(envelope["id"], "req-1");
		assert_eq!(envelope["error"]["code"], TOOL_NOT_FOUND);
		assert!(envelope.get("result").is_none());
	}

	#[test]
	fn result_envelopes_echo_the_request_id() {
		let envelope = result_envelope(Value::from(7), serde_json::json!({ "ok": true }));

		assert_eq!(envelope["id"], 7);
		assert_eq!(envelope["result"]["ok"], true);
		assert!(envelope.get("error").is_none());
	}

	#[test]
	fn invalid_query_keeps_its_message_for_the_caller() {
		let err = map_service_error(ServiceError::InvalidQuery {
			message: "top_k must be greater than zero.".to_string(),
		});

		assert_eq!(err.code, INVALID_PARAMS);
		assert!(err.message.contains("top_k"));
	}

	#[test]
	fn backend_failures_return_a_stable_summary() {
		let err = map_service_error(ServiceError::StoreUnavailable {
			message: "connection refused (127.0.0.1:6334)".to_string(),
		});

		assert_eq!(err.code, UPSTREAM_UNAVAILABLE);
		assert!(!err.message.contains("127.0.0.1"), "Backend detail must not leak.");
	}
}
