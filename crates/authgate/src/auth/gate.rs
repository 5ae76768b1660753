//! Request authentication gate.
//!
//! One stage of the request pipeline: decides whether the path is exempt,
//! whether the session credential verifies, and mutates the request before
//! the next handler runs. The gate never terminates the chain itself.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request, Uri, header::COOKIE},
    middleware::Next,
    response::Response,
};
use log::{debug, error, warn};

use super::{AuthConfig, AuthConfigError, AuthError, BypassSet, FailureMode, Validator};

/// Terminal decision of the gate for one request.
///
/// The request has already been mutated accordingly by the time the action
/// is returned; the action itself is observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Exempt path or verified credential; forwarded as-is (plus the
    /// identity header when authenticated).
    Continue,
    /// Rewritten to the login entry point with a callback parameter.
    RedirectToLogin,
    /// Rewritten to the unauthorized entry point with a callback header.
    MarkUnauthorized,
}

struct GateInner {
    mode: FailureMode,
    cookie_name: String,
    login_path: String,
    unauthorized_path: String,
    identity_header: HeaderName,
    callback_header: HeaderName,
    callback_param: String,
    validator: Validator,
    bypass: Arc<BypassSet>,
}

/// Per-request authentication decision engine.
///
/// Cheap to clone; built once at startup from validated configuration and
/// an injected bypass registry shared with the reload path.
#[derive(Clone)]
pub struct AuthGate {
    inner: Arc<GateInner>,
}

impl AuthGate {
    /// Build a gate from configuration and an injected registry.
    ///
    /// Fails on any configuration the gate cannot serve with (missing or
    /// short secret, malformed header names or target paths) so that the
    /// process aborts before accepting traffic.
    pub fn new(config: &AuthConfig, bypass: Arc<BypassSet>) -> Result<Self, AuthConfigError> {
        config.validate()?;
        let secret = config
            .resolve_secret()?
            .ok_or(AuthConfigError::MissingSecret)?;

        let identity_header = HeaderName::from_bytes(config.identity_header.as_bytes())
            .map_err(|_| AuthConfigError::InvalidHeaderName(config.identity_header.clone()))?;
        let callback_header = HeaderName::from_bytes(config.callback_header.as_bytes())
            .map_err(|_| AuthConfigError::InvalidHeaderName(config.callback_header.clone()))?;

        Ok(Self {
            inner: Arc::new(GateInner {
                mode: config.mode,
                cookie_name: config.cookie_name.clone(),
                login_path: config.login_path.clone(),
                unauthorized_path: config.unauthorized_path.clone(),
                identity_header,
                callback_header,
                callback_param: config.callback_param.clone(),
                validator: Validator::new(&secret),
                bypass,
            }),
        })
    }

    /// Decide and mutate: exactly one of the three terminal mutations is
    /// applied to `req` before this returns.
    pub fn authenticate(&self, req: &mut Request<Body>) -> GateAction {
        let identity = request_identity(req.uri());

        if self.inner.bypass.is_unprotected(&identity) {
            return GateAction::Continue;
        }

        // A caller-supplied identity header must never survive past the
        // gate on a protected path.
        req.headers_mut().remove(&self.inner.identity_header);

        // The login page is never self-authenticating, stale or valid
        // credential alike.
        if self.inner.mode == FailureMode::HeaderSignal
            && req.uri().path() == self.inner.login_path
        {
            return self.deny(req, &identity);
        }

        let token = req
            .headers()
            .get(COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| token_from_cookie_header(h, &self.inner.cookie_name))
            .map(str::to_owned);

        let outcome = match token {
            Some(token) if !token.is_empty() => self.inner.validator.validate(&token),
            _ => Err(AuthError::NoCredential),
        };

        let claims = match outcome {
            Ok(claims) => claims,
            Err(err) => {
                match err {
                    AuthError::NoCredential => debug!("{identity}: {err}"),
                    _ => warn!("{identity}: {err}"),
                }
                return self.deny(req, &identity);
            }
        };

        match HeaderValue::from_str(&claims.login) {
            Ok(value) => {
                req.headers_mut()
                    .append(self.inner.identity_header.clone(), value);
                GateAction::Continue
            }
            Err(_) => {
                warn!("{identity}: credential login is not a valid header value");
                self.deny(req, &identity)
            }
        }
    }

    /// Apply the configured failure mutation. `identity` is the original
    /// path+query, captured before any rewrite.
    fn deny(&self, req: &mut Request<Body>, identity: &str) -> GateAction {
        match self.inner.mode {
            FailureMode::Redirect => {
                let query = format!(
                    "{}={}",
                    self.inner.callback_param,
                    urlencoding::encode(identity)
                );
                let rewritten = rewrite_uri(req.uri(), &self.inner.login_path, Some(&query));
                *req.uri_mut() = rewritten;
                GateAction::RedirectToLogin
            }
            FailureMode::HeaderSignal => {
                match HeaderValue::from_str(identity) {
                    Ok(value) => {
                        req.headers_mut()
                            .insert(self.inner.callback_header.clone(), value);
                    }
                    Err(_) => warn!("{identity}: not a valid header value, callback omitted"),
                }
                let query = req.uri().query().map(str::to_owned);
                let rewritten =
                    rewrite_uri(req.uri(), &self.inner.unauthorized_path, query.as_deref());
                *req.uri_mut() = rewritten;
                GateAction::MarkUnauthorized
            }
        }
    }
}

/// The request's canonical path+query identity, as used for the bypass
/// check and as the original destination carried through a failure.
fn request_identity(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Swap the path (and optionally the query) of a request URI, keeping
/// scheme and authority.
fn rewrite_uri(uri: &Uri, path: &str, query: Option<&str>) -> Uri {
    let path_and_query = match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    };

    let mut builder = Uri::builder();
    if let Some(scheme) = uri.scheme() {
        builder = builder.scheme(scheme.clone());
    }
    if let Some(authority) = uri.authority() {
        builder = builder.authority(authority.clone());
    }

    match builder.path_and_query(path_and_query.as_str()).build() {
        Ok(rewritten) => rewritten,
        Err(err) => {
            error!("failed to rewrite request uri to {path_and_query}: {err}");
            uri.clone()
        }
    }
}

fn token_from_cookie_header<'a>(cookie_header: &'a str, cookie_name: &str) -> Option<&'a str> {
    cookie_header.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        if name.trim() == cookie_name {
            Some(value.trim())
        } else {
            None
        }
    })
}

/// Authentication middleware.
///
/// Mutates the request per the gate decision, then always invokes the next
/// handler in the chain; the response is whatever downstream produces for
/// the (possibly rewritten) request.
pub async fn auth_gate(
    State(gate): State<AuthGate>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let action = gate.authenticate(&mut req);
    if action != GateAction::Continue {
        debug!("request rerouted to {} ({action:?})", req.uri().path());
    }
    next.run(req).await
}
