//! Test utilities and common setup.
#![allow(clippy::field_reassign_with_default)]
#![allow(dead_code)]

use std::sync::Arc;

use authgate::api::{self, AppState, UpstreamState};
use authgate::auth::{
    AuthConfig, AuthGate, BypassSet, Claims, FailureMode, apply_bypass_config, auth_gate,
};
use axum::{Json, Router, body::Body, extract::Request, http::Response, middleware};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};

pub const TEST_SECRET: &str = "integration-test-signing-secret-32-chars-min";

/// Auth configuration the way an operator would run the gate, with one
/// extra exempt prefix for the bypass scenarios.
pub fn test_auth_config(mode: FailureMode) -> AuthConfig {
    let mut config = AuthConfig::default();
    config.secret = Some(TEST_SECRET.to_string());
    config.mode = mode;
    config.bypass = vec!["/public".to_string()];
    config
}

/// Echo continuation: reports the request exactly as a backend would see
/// it after the gate ran.
async fn echo(req: Request) -> Json<Value> {
    Json(json!({
        "uri": req.uri().to_string(),
        "path": req.uri().path(),
        "query": req.uri().query(),
        "identity": header_values(&req, "x-auth-login"),
        "callback": header_values(&req, "x-auth-callback"),
    }))
}

fn header_values(req: &Request, name: &str) -> Vec<String> {
    req.headers()
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Router with the gate layered over an echo continuation, for asserting
/// the exact mutation the backend observes.
pub fn gate_app(mode: FailureMode) -> Router {
    let config = test_auth_config(mode);
    let bypass = Arc::new(BypassSet::new());
    apply_bypass_config(&config, &[], &bypass);
    let gate = AuthGate::new(&config, bypass).expect("gate builds from test config");

    Router::new()
        .fallback(echo)
        .layer(middleware::from_fn_with_state(gate, auth_gate))
}

/// The full proxy pipeline (`api::create_router`) pointed at `upstream`.
pub fn proxy_app(mode: FailureMode, upstream: &str) -> Router {
    let config = test_auth_config(mode);
    let bypass = Arc::new(BypassSet::new());
    apply_bypass_config(&config, &[], &bypass);
    let gate = AuthGate::new(&config, bypass.clone()).expect("gate builds from test config");

    let state = AppState::new(gate, bypass, UpstreamState::new(upstream, 1024 * 1024));
    api::create_router(state)
}

/// Spawn an echo backend on an ephemeral port and return its base URL.
pub async fn spawn_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind upstream listener");
    let addr = listener.local_addr().expect("upstream local addr");

    let app = Router::new().fallback(echo);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve upstream");
    });

    format!("http://{addr}")
}

/// Sign a credential for `login` with the test secret, valid for an hour.
pub fn make_token(login: &str) -> String {
    sign(&Claims::new(login, 3600), TEST_SECRET)
}

/// Sign a credential that expired ten minutes ago.
pub fn expired_token(login: &str) -> String {
    let mut claims = Claims::new(login, 3600);
    claims.exp = Some(chrono::Utc::now().timestamp() - 600);
    sign(&claims, TEST_SECRET)
}

/// Sign a credential with a secret the gate was not configured with.
pub fn forged_token(login: &str) -> String {
    sign(
        &Claims::new(login, 3600),
        "a-secret-the-gate-does-not-know-32-chars",
    )
}

fn sign(claims: &Claims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("sign test credential")
}

/// Parse a JSON response body.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is JSON")
}
