//! In-memory cache of the last built dashboards

use crate::snapshot::CachedSnapshot;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Cached item with expiration
struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Thread-safe snapshot cache keyed by sheet, with TTL and max-entry bounds
///
/// Expired entries are still returned by [`SnapshotCache::get_stale`] so a
/// failed refresh can fall back without touching the database.
pub struct SnapshotCache {
    snapshots: RwLock<HashMap<String, CacheEntry<CachedSnapshot>>>,
    default_ttl: Duration,
    max_entries: usize,
}

impl SnapshotCache {
    pub fn with_capacity(default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            default_ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn new(default_ttl: Duration) -> Self {
        Self::with_capacity(default_ttl, 16)
    }

    /// Snapshot for `key` if not expired
    pub fn get(&self, key: &str) -> Option<CachedSnapshot> {
        let cache = self.snapshots.read().ok()?;
        let entry = cache.get(key)?;

        if entry.is_expired() {
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// Snapshot for `key` regardless of age
    pub fn get_stale(&self, key: &str) -> Option<CachedSnapshot> {
        let cache = self.snapshots.read().ok()?;
        cache.get(key).map(|entry| entry.value.clone())
    }

    /// Insert or replace the snapshot for `key`.
    /// Evicts expired entries, then the oldest, when at capacity.
    pub fn insert(&self, key: &str, snapshot: CachedSnapshot) {
        self.insert_with_ttl(key, snapshot, self.default_ttl);
    }

    pub fn insert_with_ttl(&self, key: &str, snapshot: CachedSnapshot, ttl: Duration) {
        if let Ok(mut cache) = self.snapshots.write() {
            if !cache.contains_key(key) && cache.len() >= self.max_entries {
                cache.retain(|_, entry| !entry.is_expired());
            }

            if !cache.contains_key(key) && cache.len() >= self.max_entries {
                if let Some(oldest_key) = cache
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone())
                {
                    cache.remove(&oldest_key);
                }
            }

            cache.insert(
                key.to_string(),
                CacheEntry {
                    value: snapshot,
                    inserted_at: Instant::now(),
                    ttl,
                },
            );
        }
    }

    pub fn invalidate(&self, key: &str) {
        if let Ok(mut cache) = self.snapshots.write() {
            cache.remove(key);
        }
    }

    /// Clear all expired entries
    pub fn cleanup(&self) {
        if let Ok(mut cache) = self.snapshots.write() {
            cache.retain(|_, entry| !entry.is_expired());
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        // Matches the default refresh interval
        Self::with_capacity(Duration::from_secs(300), 16)
    }
}
