//! Rate Limit Module
//!
//! Fixed-window request counters per client and per-route limit tables.

mod bucket;
mod policy;
mod store;

pub use bucket::{RateBucket, RateDecision, RateLimiterStats, RateUsage};
pub use policy::{RateLimitRule, RouteRateLimitResolver};
pub use store::RateBucketStore;
