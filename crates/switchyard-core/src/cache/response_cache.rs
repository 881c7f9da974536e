//! Concurrent TTL cache

use super::types::{CacheEntry, CacheStatistics};
use crate::config::CacheSettings;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Keyed store of completed results.
///
/// Reads never return an entry past its `expires_at`. There is no background
/// sweep: expired entries go on read, on [`ResponseCache::purge_expired`], or
/// when a write finds the store at its size cap.
#[derive(Debug)]
pub struct ResponseCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            max_entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self::new(settings.ttl(), settings.max_entries)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Payload for `key` if present and unexpired; expired entries are evicted
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (!entry.is_expired(now)).then(|| entry.payload.clone()));

        match lookup {
            Some(Some(payload)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "cache hit");
                Some(payload)
            }
            Some(None) => {
                if self
                    .entries
                    .remove_if(key, |_, entry| entry.is_expired(now))
                    .is_some()
                {
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `payload` for `ttl` (or the default TTL)
    pub fn set(&self, key: impl Into<String>, payload: V, ttl: Option<Duration>) {
        let key = key.into();
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            let purged = self.purge_expired();
            debug!(purged, entries = self.entries.len(), "cache at capacity, purged expired entries");
        }

        let now = Instant::now();
        let entry = CacheEntry::new(payload, now, ttl.unwrap_or(self.default_ttl));
        self.entries.insert(key, entry);
    }

    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|(_, entry)| entry.payload)
    }

    /// Drop every expired entry; returns how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before.saturating_sub(self.entries.len());
        self.evictions.fetch_add(purged as u64, Ordering::Relaxed);
        purged
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Stored entries, expired ones included until they are evicted
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    /// Clear entries and counters
    pub fn reset(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn cache() -> ResponseCache<String> {
        ResponseCache::new(Duration::from_secs(3600), 100)
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_ttl_expires_and_purges() {
        let cache = cache();
        cache.set("k", "v".to_string(), Some(Duration::from_secs(1)));
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        advance(Duration::from_millis(1001)).await;
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.len(), 0);

        let stats = cache.statistics();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl_applies() {
        let cache = cache();
        cache.set("k", "v".to_string(), None);

        advance(Duration::from_secs(3599)).await;
        assert!(cache.contains("k"));
        advance(Duration::from_secs(2)).await;
        assert!(!cache.contains("k"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_triggers_purge_not_lru() {
        let cache: ResponseCache<u32> = ResponseCache::new(Duration::from_secs(60), 2);
        cache.set("old", 1, Some(Duration::from_secs(1)));
        cache.set("live", 2, None);

        advance(Duration::from_secs(2)).await;
        cache.set("new", 3, None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("live"), Some(2));
        assert_eq!(cache.get("new"), Some(3));

        // Nothing expired: the write still lands
        cache.set("extra", 4, None);
        assert_eq!(cache.len(), 3);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let cache = cache();
        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);

        assert_eq!(cache.remove("a").as_deref(), Some("1"));
        assert_eq!(cache.get("a"), None);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_counts() {
        let cache = cache();
        cache.set("a", "1".to_string(), Some(Duration::from_secs(1)));
        cache.set("b", "2".to_string(), Some(Duration::from_secs(1)));
        cache.set("c", "3".to_string(), None);

        advance(Duration::from_secs(5)).await;
        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.statistics().entries, 1);
    }
}
