//! Gate configuration.

use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bypass::{BypassSet, DEFAULT_BYPASS_PREFIXES};

/// How the gate signals an unauthenticated request downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureMode {
    /// Rewrite the request to the login entry point, carrying the original
    /// destination as a query parameter.
    Redirect,
    /// Rewrite the request to the unauthorized entry point, carrying the
    /// original destination in a dedicated header. Query parameters are
    /// left untouched.
    #[default]
    HeaderSignal,
}

/// Authentication gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Signing secret for session credentials (HS256).
    /// Supports `env:VAR_NAME` indirection. REQUIRED: the gate refuses to
    /// serve without it.
    pub secret: Option<String>,

    /// Name of the cookie carrying the session credential.
    pub cookie_name: String,

    /// Failure handling strategy.
    pub mode: FailureMode,

    /// Path requests are rewritten to in redirect mode. Never
    /// self-authenticating in header-signal mode.
    pub login_path: String,

    /// Path requests are rewritten to in header-signal mode.
    pub unauthorized_path: String,

    /// Header carrying the verified identity to the backend.
    pub identity_header: String,

    /// Header carrying the original destination in header-signal mode.
    pub callback_header: String,

    /// Query parameter carrying the original destination in redirect mode.
    pub callback_param: String,

    /// Exempt path prefixes registered at startup and on reload.
    pub bypass: Vec<String>,

    /// Seed the fixed default prefixes (static assets, dev-server paths)
    /// in addition to `bypass`.
    pub default_bypass: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // No default secret - must be explicitly configured
            secret: None,
            cookie_name: "auth_token".to_string(),
            mode: FailureMode::default(),
            login_path: "/accounts/login".to_string(),
            unauthorized_path: "/accounts/unauthorized".to_string(),
            identity_header: "x-auth-login".to_string(),
            callback_header: "x-auth-callback".to_string(),
            callback_param: "callback".to_string(),
            bypass: Vec::new(),
            default_bypass: true,
        }
    }
}

impl AuthConfig {
    /// Resolve the signing secret, expanding `env:VAR_NAME` syntax.
    /// Returns the resolved secret or None if not configured.
    pub fn resolve_secret(&self) -> Result<Option<String>, AuthConfigError> {
        match &self.secret {
            None => Ok(None),
            Some(value) => {
                if let Some(var_name) = value.strip_prefix("env:") {
                    match std::env::var(var_name) {
                        Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                        Ok(_) => Err(AuthConfigError::EnvVarEmpty(var_name.to_string())),
                        Err(_) => Err(AuthConfigError::EnvVarNotFound(var_name.to_string())),
                    }
                } else {
                    Ok(Some(value.clone()))
                }
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Run before the listener binds: a gate serving traffic with a
    /// missing or weak secret would fail every credential check open to
    /// abuse, so configuration problems abort startup instead.
    pub fn validate(&self) -> Result<(), AuthConfigError> {
        let secret = self
            .resolve_secret()?
            .ok_or(AuthConfigError::MissingSecret)?;
        if secret.len() < 32 {
            return Err(AuthConfigError::SecretTooShort);
        }

        if !self.login_path.starts_with('/') {
            return Err(AuthConfigError::PathNotAbsolute("login_path"));
        }
        if !self.unauthorized_path.starts_with('/') {
            return Err(AuthConfigError::PathNotAbsolute("unauthorized_path"));
        }

        for name in [&self.identity_header, &self.callback_header] {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(AuthConfigError::InvalidHeaderName(name.clone()));
            }
        }

        if self.cookie_name.trim().is_empty() {
            return Err(AuthConfigError::EmptyValue("cookie_name"));
        }
        if self.callback_param.trim().is_empty() {
            return Err(AuthConfigError::EmptyValue("callback_param"));
        }

        Ok(())
    }

    /// Generate a secure random signing secret using cryptographically
    /// secure RNG.
    pub fn generate_secret() -> String {
        use rand::Rng;

        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        const SECRET_LENGTH: usize = 64;

        let mut rng = rand::rng();
        (0..SECRET_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}

/// Apply the exempt-path configuration to a registry in one atomic pass.
///
/// The new set is the fixed defaults (when `default_bypass` is on), the
/// configured prefixes, and any prefixes contributed by service discovery.
pub fn apply_bypass_config(config: &AuthConfig, discovered: &[String], bypass: &BypassSet) {
    let defaults: &[&str] = if config.default_bypass {
        DEFAULT_BYPASS_PREFIXES
    } else {
        &[]
    };

    let prefixes = defaults
        .iter()
        .map(|prefix| (*prefix).to_string())
        .chain(config.bypass.iter().cloned())
        .chain(discovered.iter().cloned());

    bypass.replace(prefixes);
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthConfigError {
    /// No signing secret configured.
    #[error("signing secret is required; set auth.secret before serving")]
    MissingSecret,

    /// Secret too short for HS256.
    #[error("signing secret must be at least 32 characters long")]
    SecretTooShort,

    /// Environment variable not found (for `env:VAR_NAME` syntax).
    #[error("environment variable '{0}' not found")]
    EnvVarNotFound(String),

    /// Environment variable is empty (for `env:VAR_NAME` syntax).
    #[error("environment variable '{0}' is empty")]
    EnvVarEmpty(String),

    /// Rewrite target paths must be absolute.
    #[error("{0} must start with '/'")]
    PathNotAbsolute(&'static str),

    /// Configured header name does not parse.
    #[error("'{0}' is not a valid header name")]
    InvalidHeaderName(String),

    /// Required configuration value left blank.
    #[error("{0} must not be empty")]
    EmptyValue(&'static str),
}
