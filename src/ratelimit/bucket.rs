//! Fixed-window bucket and the values reported about it.

use serde::Serialize;

/// Request counter for one client within one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateBucket {
    pub count: u32,
    pub limit: u32,
    /// End of the current window (Unix milliseconds)
    pub window_reset_at: u64,
}

impl RateBucket {
    /// Opens a window at `now` with the first request already counted.
    pub fn open(limit: u32, now: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            limit,
            window_reset_at: now.saturating_add(window_ms),
        }
    }

    /// A window stays live up to and including its reset instant.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.window_reset_at
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Unix milliseconds at which the window resets
    pub reset_at: u64,
    /// Only set on denial
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Read-only view of a client's bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateUsage {
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: u64,
}

/// Limiter-wide figures for the admin surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimiterStats {
    pub active_buckets: usize,
    pub window_ms: u64,
}
