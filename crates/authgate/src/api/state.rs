//! Application state shared across handlers.

use std::sync::Arc;

use axum::body::Body;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use crate::auth::{AuthGate, BypassSet};

/// Upstream forwarding configuration for the API layer.
#[derive(Clone)]
pub struct UpstreamState {
    /// Base URL of the backend every request is forwarded to.
    pub base_url: String,
    /// Shared HTTP client for upstream requests.
    pub client: Client<HttpConnector, Body>,
    /// Maximum buffered request body size in bytes.
    pub max_body_bytes: usize,
}

impl UpstreamState {
    /// Build forwarding state with a fresh pooled client.
    pub fn new(base_url: impl Into<String>, max_body_bytes: usize) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::builder(TokioExecutor::new()).build_http(),
            max_body_bytes,
        }
    }
}

/// State shared by the router.
#[derive(Clone)]
pub struct AppState {
    /// Per-request authentication decision engine.
    pub gate: AuthGate,
    /// Exempt-path registry, shared with the reload path.
    pub bypass: Arc<BypassSet>,
    /// Upstream forwarding configuration.
    pub upstream: UpstreamState,
}

impl AppState {
    /// Create app state from its components.
    pub fn new(gate: AuthGate, bypass: Arc<BypassSet>, upstream: UpstreamState) -> Self {
        Self {
            gate,
            bypass,
            upstream,
        }
    }
}
