//! Revoked session token ids.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Set of revoked token ids (`jti`), each kept until the token would have
/// expired anyway.
#[derive(Debug, Default)]
pub struct TokenRevocations {
    revoked: DashMap<String, DateTime<Utc>>,
}

impl TokenRevocations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `jti` as revoked until `expires_at`, dropping entries that have
    /// already lapsed.
    pub fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) {
        let now = Utc::now();
        self.revoked.retain(|_, until| *until > now);
        self.revoked.insert(jti.to_string(), expires_at);
    }

    #[must_use]
    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.contains_key(jti)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}
