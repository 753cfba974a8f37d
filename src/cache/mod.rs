//! Cache Module
//!
//! In-memory response cache with TTL expiration, LRU eviction, per-route
//! policies and explicit invalidation hooks.

mod entry;
mod invalidation;
pub mod key;
mod lru;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use invalidation::CacheInvalidator;
pub use key::{cache_key, ANONYMOUS};
pub use lru::LruTracker;
pub use policy::{is_mutation, CachePolicy, CacheRouteRule, RouteCachePolicyResolver};
pub use stats::CacheStats;
pub use store::CacheStore;
