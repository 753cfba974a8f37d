//! Rate Bucket Store Module
//!
//! Fixed-window request counters keyed by client identity.
//!
//! Every request in a window shares one reset instant, so a client can send
//! `limit` requests at the end of one window and `limit` more right after it
//! resets.

use std::collections::HashMap;

use tracing::debug;

use crate::clock::current_timestamp_ms;
use crate::ratelimit::{RateBucket, RateDecision, RateLimiterStats, RateUsage};

// == Rate Bucket Store ==
/// Per-client fixed-window counters.
///
/// Not synchronized by itself; the middleware shares it behind
/// `Arc<RwLock<RateBucketStore>>`.
#[derive(Debug)]
pub struct RateBucketStore {
    buckets: HashMap<String, RateBucket>,
    window_ms: u64,
}

impl RateBucketStore {
    pub fn new(window_ms: u64) -> Self {
        Self {
            buckets: HashMap::new(),
            window_ms,
        }
    }

    // == Admission ==
    /// Counts one request for `client_id` against `limit`.
    pub fn is_allowed(&mut self, client_id: &str, limit: u32) -> RateDecision {
        self.is_allowed_at(client_id, limit, current_timestamp_ms())
    }

    /// [`is_allowed`](Self::is_allowed) with an explicit clock reading.
    pub fn is_allowed_at(&mut self, client_id: &str, limit: u32, now: u64) -> RateDecision {
        if limit == 0 {
            let reset_at = self
                .buckets
                .get(client_id)
                .filter(|bucket| !bucket.is_expired_at(now))
                .map_or(now.saturating_add(self.window_ms), |bucket| bucket.window_reset_at);
            return denied(limit, reset_at, now);
        }

        let live = self
            .buckets
            .get_mut(client_id)
            .filter(|bucket| !bucket.is_expired_at(now));

        if let Some(bucket) = live {
            bucket.limit = limit;
            if bucket.count >= limit {
                return denied(limit, bucket.window_reset_at, now);
            }
            bucket.count += 1;
            return RateDecision {
                allowed: true,
                limit,
                remaining: bucket.remaining(),
                reset_at: bucket.window_reset_at,
                retry_after_secs: None,
            };
        }

        let bucket = RateBucket::open(limit, now, self.window_ms);
        let decision = RateDecision {
            allowed: true,
            limit,
            remaining: bucket.remaining(),
            reset_at: bucket.window_reset_at,
            retry_after_secs: None,
        };
        self.buckets.insert(client_id.to_string(), bucket);
        decision
    }

    // == Usage ==
    /// Snapshot of a client's live bucket, `None` if it has none.
    pub fn usage(&self, client_id: &str) -> Option<RateUsage> {
        self.usage_at(client_id, current_timestamp_ms())
    }

    /// [`usage`](Self::usage) with an explicit clock reading.
    pub fn usage_at(&self, client_id: &str, now: u64) -> Option<RateUsage> {
        self.buckets
            .get(client_id)
            .filter(|bucket| !bucket.is_expired_at(now))
            .map(|bucket| RateUsage {
                count: bucket.count,
                limit: bucket.limit,
                remaining: bucket.remaining(),
                reset_at: bucket.window_reset_at,
            })
    }

    // == Reset ==
    /// Deletes a client's bucket unconditionally.
    pub fn reset(&mut self, client_id: &str) -> bool {
        self.buckets.remove(client_id).is_some()
    }

    // == Sweep ==
    /// Removes buckets whose window has expired.
    pub fn sweep(&mut self) -> usize {
        self.sweep_at(current_timestamp_ms())
    }

    /// [`sweep`](Self::sweep) with an explicit clock reading.
    pub fn sweep_at(&mut self, now: u64) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.is_expired_at(now));
        let removed = before - self.buckets.len();
        if removed > 0 {
            debug!(removed, "swept expired rate limit buckets");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            active_buckets: self.buckets.len(),
            window_ms: self.window_ms,
        }
    }
}

fn denied(limit: u32, reset_at: u64, now: u64) -> RateDecision {
    let wait_ms = reset_at.saturating_sub(now);
    RateDecision {
        allowed: false,
        limit,
        remaining: 0,
        reset_at,
        retry_after_secs: Some(wait_ms.div_ceil(1000).max(1)),
    }
}
