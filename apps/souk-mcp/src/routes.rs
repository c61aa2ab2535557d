use axum::{
	Json, Router,
	extract::State,
	routing::{get, post},
};
use serde_json::Value;

use crate::{rpc, state::AppState};

pub fn router(state: AppState) -> Router {
	Router::new().route("/", get(status)).route("/mcp", post(mcp)).with_state(state)
}

/// Liveness endpoint. Reports whether the catalog collection is reachable;
/// it carries no JSON-RPC semantics.
async fn status(State(state): State<AppState>) -> Json<Value> {
	let store_connected = state.service.catalog.exists().await.unwrap_or(false);

	Json(serde_json::json!({
		"name": rpc::SERVER_NAME,
		"status": "online",
		"protocol": "mcp-http",
		"store_connected": store_connected,
	}))
}

async fn mcp(State(state): State<AppState>, body: String) -> Json<Value> {
	Json(rpc::handle(&state, &body).await)
}
