//! Credential failure taxonomy.

use thiserror::Error;

/// Why a session credential was rejected.
///
/// Every variant collapses to the same observable outcome — the configured
/// failure action. The distinctions exist for logging only and are never
/// surfaced to the requester.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session cookie, or an empty one.
    #[error("no session credential")]
    NoCredential,

    /// The token could not be decoded.
    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    /// The token decoded but its signature does not verify against the
    /// configured secret.
    #[error("credential signature did not verify")]
    InvalidSignature,

    /// The token carries an `exp` claim in the past.
    #[error("credential expired")]
    Expired,

    /// Structurally valid token without a usable `login` claim.
    #[error("credential carries no identity")]
    MissingIdentityClaim,
}
