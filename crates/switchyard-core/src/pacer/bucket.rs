//! Token bucket

use std::time::Duration;
use tokio::time::Instant;

/// Absorbs float drift so a refilled token is never reported as 0.999...
const TOKEN_EPSILON: f64 = 1e-9;

/// Token bucket whose refill rate is supplied on every refill.
///
/// `tokens` always stays within `[0, capacity]`; a fresh bucket starts full.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, now: Instant) -> Self {
        let capacity = capacity.max(1) as f64;
        Self {
            capacity,
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Add tokens for the time elapsed since the last refill
    pub fn refill(&mut self, now: Instant, rate: f64) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Consume one token if available
    pub fn try_take(&mut self) -> bool {
        if self.tokens >= 1.0 - TOKEN_EPSILON {
            self.tokens = (self.tokens - 1.0).max(0.0);
            true
        } else {
            false
        }
    }

    /// Time until one full token is available at `rate`
    pub fn deficit_wait(&self, rate: f64) -> Duration {
        if self.tokens >= 1.0 - TOKEN_EPSILON {
            return Duration::ZERO;
        }
        Duration::from_secs_f64((1.0 - self.tokens) / rate).max(Duration::from_millis(1))
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_full_and_drains() {
        let now = Instant::now();
        let mut bucket = TokenBucket::new(2, now);
        assert!(bucket.try_take());
        assert!(bucket.try_take());
        assert!(!bucket.try_take());
        assert_eq!(bucket.deficit_wait(1.0), Duration::from_secs(1));
    }

    #[test]
    fn test_refill_is_capped() {
        let now = Instant::now();
        let mut bucket = TokenBucket::new(3, now);
        bucket.try_take();
        bucket.refill(now + Duration::from_secs(100), 10.0);
        assert_eq!(bucket.tokens(), bucket.capacity());
    }

    #[test]
    fn test_partial_refill() {
        let now = Instant::now();
        let mut bucket = TokenBucket::new(1, now);
        assert!(bucket.try_take());
        bucket.refill(now + Duration::from_millis(500), 1.0);
        assert!(!bucket.try_take());
        assert_eq!(bucket.deficit_wait(1.0), Duration::from_millis(500));
    }
}
