//! Cache entry and statistics types

use crate::config::MAX_WINDOW_SECS;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// A stored payload with its lifetime
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub payload: V,
    pub cached_at: Instant,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn new(payload: V, now: Instant, ttl: Duration) -> Self {
        Self {
            payload,
            cached_at: now,
            expires_at: now + ttl.min(Duration::from_secs(MAX_WINDOW_SECS)),
        }
    }

    /// Readable while `now <= expires_at`
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.cached_at)
    }
}

/// Cache counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    /// Entries removed because they expired
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStatistics {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total_requests = self.hits + self.misses;
        if total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / total_requests as f64
        }
    }
}
