//! Router assembly.

use axum::{Router, middleware, routing::get};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::auth_gate;
use crate::proxy;

use super::handlers;
use super::state::AppState;

/// Create the request pipeline.
///
/// Every request falls through the gate into the upstream forwarder.
/// `/health` is mounted after the gate layer, so the proxy answers it
/// itself, credential or not.
pub fn create_router(state: AppState) -> Router {
    // Tracing layer with request spans and timing
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Clone gate state for middleware
    let gate = state.gate.clone();

    Router::new()
        .fallback(proxy::forward)
        .layer(middleware::from_fn_with_state(gate, auth_gate))
        .route("/health", get(handlers::health))
        .layer(trace_layer)
        .with_state(state)
}
