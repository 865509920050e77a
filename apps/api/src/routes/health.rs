use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version and the active matcher backends.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "match-api",
        "store": state.matcher.store_backend(),
        "cache": state.matcher.cache_backend(),
        "scorer": state.matcher.scorer_backend(),
    }))
}
