//! Registry of path prefixes exempt from authentication.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Prefixes reinstated by [`BypassSet::reset_to_defaults`]: static assets
/// and dev-server endpoints that never carry a session credential.
pub const DEFAULT_BYPASS_PREFIXES: &[&str] =
    &["/static", "/assets", "/favicon.ico", "/sockjs-node"];

/// Normalize a prefix or request identity to end with a path separator,
/// so `/public` never matches `/publicity`.
fn normalize(path: &str) -> Cow<'_, str> {
    if path.ends_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("{path}/"))
    }
}

/// Set of normalized path prefixes for which authentication is skipped.
///
/// Shared by every request worker and mutated only by configuration
/// application. All mutation happens under the write lock in one critical
/// section, so a reload can never expose a partially-applied set to a
/// concurrent reader.
///
/// Matching is case-sensitive and performs no separator collapsing or
/// `.`/`..` resolution; paths are expected to arrive canonicalized from
/// the transport layer.
#[derive(Debug, Default)]
pub struct BypassSet {
    prefixes: RwLock<HashSet<String>>,
}

impl BypassSet {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prefix. Idempotent; never fails.
    pub fn add(&self, prefix: &str) {
        let normalized = normalize(prefix).into_owned();
        self.write().insert(normalized);
    }

    /// Atomically replace the set with the empty set.
    pub fn reset(&self) {
        *self.write() = HashSet::new();
    }

    /// Atomically replace the set with the fixed default seed.
    pub fn reset_to_defaults(&self) {
        *self.write() = DEFAULT_BYPASS_PREFIXES
            .iter()
            .map(|prefix| normalize(prefix).into_owned())
            .collect();
    }

    /// Atomically replace the whole set with `prefixes`.
    ///
    /// Configuration reloads go through here so that no request can
    /// observe a half-applied exempt list.
    pub fn replace<I, S>(&self, prefixes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let next: HashSet<String> = prefixes
            .into_iter()
            .map(|prefix| normalize(prefix.as_ref()).into_owned())
            .collect();
        *self.write() = next;
    }

    /// True iff any registered prefix is a string prefix of the normalized
    /// identity. Existence-based; no entry ordering dependency.
    pub fn is_unprotected(&self, identity: &str) -> bool {
        let candidate = normalize(identity);
        self.read()
            .iter()
            .any(|prefix| candidate.starts_with(prefix.as_str()))
    }

    /// Number of registered prefixes.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True when no prefixes are registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.prefixes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.prefixes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
