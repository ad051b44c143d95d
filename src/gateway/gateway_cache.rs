use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::constants::READ_CACHE_MAX_ENTRIES;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// In-memory TTL cache for gateway read paths.
///
/// Only plain reads (user detail, loan list) go through this cache.
/// Workflow transition preconditions always read the store directly, so a
/// stale entry can never gate a state change.
pub struct TtlCache<V: Clone> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        // The read guard must be released before removing an expired entry
        let expired = match self.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.value.clone())
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        if self.entries.len() >= READ_CACHE_MAX_ENTRIES {
            self.entries
                .retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        }
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
    }
}
