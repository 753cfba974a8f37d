//! Cache Invalidation Hooks
//!
//! Handles that mutation handlers call after a successful write. The cache
//! middleware never invalidates on its own, so a write path that skips these
//! calls serves stale reads until the TTL runs out.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::key::KeyParts;
use crate::cache::CacheStore;

/// Cloneable handle exposing the invalidation hooks over a shared store.
#[derive(Clone, Debug)]
pub struct CacheInvalidator {
    cache: Arc<RwLock<CacheStore>>,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<RwLock<CacheStore>>) -> Self {
        Self { cache }
    }

    /// Drops every cached view of one entity plus its collection listing.
    ///
    /// `entity("/items", "42")` removes `/items/42`, `/items/42/...` and
    /// `/items` (any query string) for every identity.
    pub async fn entity(&self, collection: &str, id: &str) -> usize {
        let removed = self
            .cache
            .write()
            .await
            .invalidate_where(|key| KeyParts::parse(key).is_some_and(|k| k.is_entity(collection, id)));
        debug!(collection, id, removed, "invalidated entity");
        removed
    }

    /// Drops every entry cached for one user.
    pub async fn client(&self, user_id: &str) -> usize {
        let removed = self
            .cache
            .write()
            .await
            .invalidate_where(|key| {
                KeyParts::parse(key).is_some_and(|k| k.user_id().as_deref() == Some(user_id))
            });
        debug!(user_id, removed, "invalidated client partition");
        removed
    }

    /// Drops one exact key.
    pub async fn key(&self, key: &str) -> bool {
        let removed = self.cache.write().await.invalidate(key);
        debug!(key, removed, "invalidated key");
        removed
    }

    /// Drops every identity partition and query variant of one exact path.
    pub async fn path(&self, path: &str) -> usize {
        let removed = self
            .cache
            .write()
            .await
            .invalidate_where(|key| KeyParts::parse(key).is_some_and(|k| k.path == path));
        debug!(path, removed, "invalidated path");
        removed
    }

    /// Drops every entry whose path starts with `prefix`.
    pub async fn prefix(&self, prefix: &str) -> usize {
        let removed = self
            .cache
            .write()
            .await
            .invalidate_where(|key| KeyParts::parse(key).is_some_and(|k| k.path.starts_with(prefix)));
        debug!(prefix, removed, "invalidated prefix");
        removed
    }
}
