//! Cache Entry Module
//!
//! Defines a cached response payload with its expiry metadata.

use serde_json::Value;

// == Cache Entry ==
/// A cached JSON payload with creation and expiry timestamps.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored response payload
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry at `now` that lives for `ttl_ms` milliseconds.
    pub fn new(value: Value, now: u64, ttl_ms: u64) -> Self {
        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// The entry is still served at exactly `expires_at` and is stale from
    /// the following millisecond on.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.expires_at
    }
}
