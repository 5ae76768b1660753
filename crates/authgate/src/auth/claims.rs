//! Decoded credential claims.

use serde::{Deserialize, Serialize};

/// Claims carried by a verified session credential.
///
/// `login` is the identity the credential asserts; the validator rejects
/// credentials where it is absent or empty. The remaining fields are
/// standard token metadata passed through when the issuer sets them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity asserted by the credential.
    #[serde(default)]
    pub login: String,

    /// Expiry, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued-at, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Subject, when the issuer sets one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

impl Claims {
    /// Claims asserting `login`, expiring `ttl_secs` from now.
    pub fn new(login: impl Into<String>, ttl_secs: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            login: login.into(),
            exp: Some(now + ttl_secs),
            iat: Some(now),
            sub: None,
        }
    }
}
