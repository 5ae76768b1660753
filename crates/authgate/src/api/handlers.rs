//! Endpoints served by the gate process itself.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use super::state::AppState;

/// Liveness endpoint; answered locally, no credential required.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "bypass_prefixes": state.bypass.len(),
    }))
}
