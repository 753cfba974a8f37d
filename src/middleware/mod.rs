//! Middleware Module
//!
//! Rate limiting and response caching as axum middleware, sharing one
//! [`GuardState`] built at startup.
//!
//! Request order: rate limit (outermost) → cache → handlers.

mod buffer;
mod cache;
mod identity;
mod rate_limit;

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::Router;
use tokio::sync::RwLock;

use crate::cache::{CacheInvalidator, CacheStats, CacheStore, RouteCachePolicyResolver};
use crate::config::Config;
use crate::ratelimit::{RateBucketStore, RateLimiterStats, RouteRateLimitResolver};

pub use buffer::{BufferedResponse, Captured};
pub use cache::{cache_middleware, X_CACHE};
pub use identity::{AuthenticatedUser, ClientIdentity, API_KEY_HEADER, FORWARDED_FOR_HEADER};
pub use rate_limit::{
    rate_limit_middleware, X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET,
};

/// Stores and policy tables shared by both middlewares.
///
/// Each store sits behind a single coarse lock; cloning the state clones
/// the handles, not the stores.
#[derive(Clone, Debug)]
pub struct GuardState {
    pub cache: Arc<RwLock<CacheStore>>,
    pub buckets: Arc<RwLock<RateBucketStore>>,
    pub cache_policies: Arc<RouteCachePolicyResolver>,
    pub rate_limits: Arc<RouteRateLimitResolver>,
    /// Largest body the cache middleware will buffer
    pub max_body_bytes: usize,
    pub trust_forwarded_for: bool,
}

impl GuardState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache: Arc::new(RwLock::new(CacheStore::new(
                config.cache_max_entries,
                config.cache_default_ttl_ms,
            ))),
            buckets: Arc::new(RwLock::new(RateBucketStore::new(
                config.rate_limit_window_ms,
            ))),
            cache_policies: Arc::new(RouteCachePolicyResolver::new(
                config.cache_routes.clone(),
                config.cache_default_ttl_ms,
            )),
            rate_limits: Arc::new(RouteRateLimitResolver::new(
                config.rate_limit_routes.clone(),
                config.rate_limit_default,
            )),
            max_body_bytes: config.cache_max_body_bytes,
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }

    /// Invalidation hooks over this state's cache.
    pub fn invalidator(&self) -> CacheInvalidator {
        CacheInvalidator::new(self.cache.clone())
    }

    /// Cache and limiter figures for the admin surface.
    pub async fn stats(&self) -> (CacheStats, RateLimiterStats) {
        let cache = self.cache.read().await.stats();
        let limiter = self.buckets.read().await.stats();
        (cache, limiter)
    }
}

/// Wraps `router` with the cache middleware and, outside it, the rate limiter.
pub fn guard_layers<S>(router: Router<S>, guard: GuardState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(from_fn_with_state(guard.clone(), cache_middleware))
        .layer(from_fn_with_state(guard, rate_limit_middleware))
}
