//! Cache Store Module
//!
//! Response cache combining HashMap storage with LRU tracking and TTL expiration.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::cache::stats::Counters;
use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::clock::current_timestamp_ms;

// == Cache Store ==
/// Bounded response cache with LRU eviction and per-entry TTL.
///
/// Not synchronized by itself; the middleware shares it behind
/// `Arc<RwLock<CacheStore>>`.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Hit, miss and eviction counters
    counters: Counters,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// TTL in milliseconds for entries stored without an explicit TTL
    default_ttl_ms: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(max_entries: usize, default_ttl_ms: u64) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            counters: Counters::default(),
            max_entries: max_entries.max(1),
            default_ttl_ms,
        }
    }

    // == Set ==
    /// Stores a payload, evicting the least recently used entry when full.
    ///
    /// Overwriting an existing key resets its TTL and recency.
    pub fn set(&mut self, key: impl Into<String>, value: Value, ttl_ms: Option<u64>) {
        self.set_at(key, value, ttl_ms, current_timestamp_ms());
    }

    /// [`set`](Self::set) with an explicit clock reading.
    pub fn set_at(&mut self, key: impl Into<String>, value: Value, ttl_ms: Option<u64>, now: u64) {
        let key = key.into();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                self.counters.record_eviction();
                debug!(key = %evicted, "evicted least recently used cache entry");
            }
        }

        let ttl = ttl_ms.unwrap_or(self.default_ttl_ms);
        self.lru.touch(&key);
        self.entries.insert(key, CacheEntry::new(value, now, ttl));
    }

    // == Get ==
    /// Returns a live payload and marks it most recently used.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.get_at(key, current_timestamp_ms())
    }

    /// [`get`](Self::get) with an explicit clock reading.
    pub fn get_at(&mut self, key: &str, now: u64) -> Option<Value> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.counters.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.counters.record_miss();
            return None;
        }

        self.counters.record_hit();
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Returns true if a live entry exists, without touching recency or counters.
    pub fn contains_at(&self, key: &str, now: u64) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    // == Invalidate ==
    /// Removes a single entry. Returns whether it was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    /// Removes every entry whose key contains `pattern`.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> usize {
        self.invalidate_where(|key| key.contains(pattern))
    }

    /// Removes every entry whose key satisfies `predicate`.
    pub fn invalidate_where<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| predicate(key))
            .cloned()
            .collect();

        for key in &doomed {
            self.remove_entry(key);
        }
        doomed.len()
    }

    // == Clear ==
    /// Empties the store and resets all counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.counters = Counters::default();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.entries.len(), self.max_entries)
    }

    // == Sweep ==
    /// Removes all expired entries regardless of recency.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&mut self) -> usize {
        self.sweep_at(current_timestamp_ms())
    }

    /// [`sweep`](Self::sweep) with an explicit clock reading.
    pub fn sweep_at(&mut self, now: u64) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.remove(key);
        }
        removed
    }
}
