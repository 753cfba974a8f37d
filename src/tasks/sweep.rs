//! Expiry Sweep Tasks
//!
//! Background tasks that periodically drop expired cache entries and rate
//! limit buckets. Without them a key that is cached once and never read
//! again, or a client seen once, would stay in memory forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::middleware::GuardState;
use crate::ratelimit::RateBucketStore;

/// Spawns a task that sweeps expired entries from `cache` every `interval`.
///
/// The returned handle can be aborted to stop the task.
pub fn spawn_cache_sweep(cache: Arc<RwLock<CacheStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(?interval, "starting cache sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.sweep();
            if removed > 0 {
                info!("cache sweep: removed {} expired entries", removed);
            } else {
                debug!("cache sweep: no expired entries found");
            }
        }
    })
}

/// Spawns a task that drops rate limit buckets whose window has passed.
pub fn spawn_bucket_sweep(
    buckets: Arc<RwLock<RateBucketStore>>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(?interval, "starting rate limit sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = buckets.write().await.sweep();
            if removed > 0 {
                info!("rate limit sweep: removed {} expired buckets", removed);
            } else {
                debug!("rate limit sweep: no expired buckets found");
            }
        }
    })
}

/// Both sweep tasks plus the stores they maintain.
#[derive(Debug)]
pub struct Sweepers {
    cache_task: JoinHandle<()>,
    bucket_task: JoinHandle<()>,
    cache: Arc<RwLock<CacheStore>>,
    buckets: Arc<RwLock<RateBucketStore>>,
}

impl Sweepers {
    /// Starts sweeping both stores of `guard` every `interval`.
    pub fn spawn(guard: &GuardState, interval: Duration) -> Self {
        Self {
            cache_task: spawn_cache_sweep(guard.cache.clone(), interval),
            bucket_task: spawn_bucket_sweep(guard.buckets.clone(), interval),
            cache: guard.cache.clone(),
            buckets: guard.buckets.clone(),
        }
    }

    /// Stops both tasks and clears both stores.
    pub async fn shutdown(self) {
        self.cache_task.abort();
        self.bucket_task.abort();
        // a cancelled task reports JoinError::Cancelled, which is expected here
        let _ = self.cache_task.await;
        let _ = self.bucket_task.await;

        self.cache.write().await.clear();
        self.buckets.write().await.clear();
        info!("sweep tasks stopped and stores cleared");
    }
}
