//! Additive-increase / multiplicative-decrease rate state

use crate::config::MAX_WINDOW_SECS;
use std::time::Duration;
use tokio::time::Instant;

/// Lowest effective rate a provider can be throttled to (requests/sec)
pub const RATE_FLOOR: f64 = 0.2;
/// Multiplier applied to the current rate on every penalty
pub const PENALTY_FACTOR: f64 = 0.7;
/// Requests/sec regained per second after the penalty window
pub const RECOVERY_PER_SEC: f64 = 0.1;

/// Effective request rate for one provider.
///
/// `current_rate` always stays within `[RATE_FLOOR, base_rate]`. Recovery is
/// applied lazily when the rate is read, so no background timer is needed.
#[derive(Debug, Clone)]
pub struct AdaptiveRate {
    base_rate: f64,
    current_rate: f64,
    penalty_until: Instant,
}

impl AdaptiveRate {
    /// Base rates below the floor are raised to it
    pub fn new(base_rate: f64, now: Instant) -> Self {
        let base_rate = base_rate.max(RATE_FLOOR);
        Self {
            base_rate,
            current_rate: base_rate,
            penalty_until: now,
        }
    }

    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    /// Cut the rate and start a penalty window of `duration`.
    ///
    /// Windows longer than [`MAX_WINDOW_SECS`] are clamped.
    pub fn penalize(&mut self, now: Instant, duration: Duration) -> f64 {
        self.current_rate = (self.current_rate * PENALTY_FACTOR).max(RATE_FLOOR);
        self.penalty_until = now + duration.min(Duration::from_secs(MAX_WINDOW_SECS));
        self.current_rate
    }

    /// Read the effective rate, applying any recovery earned since the
    /// penalty window closed
    pub fn value(&mut self, now: Instant) -> f64 {
        if now > self.penalty_until && self.current_rate < self.base_rate {
            let recovered_for = now.duration_since(self.penalty_until).as_secs_f64();
            self.current_rate =
                (self.current_rate + RECOVERY_PER_SEC * recovered_for).min(self.base_rate);
            self.penalty_until = now;
        }
        self.current_rate
    }

    pub fn is_penalized(&self, now: Instant) -> bool {
        now <= self.penalty_until && self.current_rate < self.base_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_penalty_is_multiplicative() {
        let now = Instant::now();
        let mut rate = AdaptiveRate::new(2.0, now);
        assert!((rate.penalize(now, Duration::from_secs(60)) - 1.4).abs() < EPS);
        assert!((rate.value(now) - 1.4).abs() < EPS);
        assert!(rate.is_penalized(now));
    }

    #[test]
    fn test_floor_holds_under_repeated_penalties() {
        let now = Instant::now();
        let mut rate = AdaptiveRate::new(5.0, now);
        for _ in 0..100 {
            let value = rate.penalize(now, Duration::from_secs(1));
            assert!(value >= RATE_FLOOR);
        }
        assert!((rate.value(now) - RATE_FLOOR).abs() < EPS);
    }

    #[test]
    fn test_oversized_penalty_is_clamped() {
        let now = Instant::now();
        let mut rate = AdaptiveRate::new(1.0, now);
        assert!((rate.penalize(now, Duration::MAX) - 0.7).abs() < EPS);
        assert!(rate.is_penalized(now + Duration::from_secs(MAX_WINDOW_SECS)));
    }

    #[test]
    fn test_recovery_starts_after_window() {
        let start = Instant::now();
        let mut rate = AdaptiveRate::new(1.0, start);
        rate.penalize(start, Duration::from_secs(60));

        // Still inside the window
        assert!((rate.value(start + Duration::from_secs(30)) - 0.7).abs() < EPS);

        // 2s past the window: +0.2
        let value = rate.value(start + Duration::from_secs(62));
        assert!((value - 0.9).abs() < 1e-6);

        // Long after: capped at base
        assert_eq!(rate.value(start + Duration::from_secs(600)), 1.0);
        assert!(!rate.is_penalized(start + Duration::from_secs(600)));
    }

    #[test]
    fn test_recovery_is_monotonic() {
        let start = Instant::now();
        let mut rate = AdaptiveRate::new(3.0, start);
        rate.penalize(start, Duration::from_secs(10));
        rate.penalize(start, Duration::from_secs(10));

        let mut previous = rate.value(start);
        for second in 10..60 {
            let value = rate.value(start + Duration::from_secs(second));
            assert!(value >= previous);
            assert!(value <= 3.0);
            previous = value;
        }
    }

    #[test]
    fn test_base_below_floor_is_raised() {
        let now = Instant::now();
        let mut rate = AdaptiveRate::new(0.05, now);
        assert_eq!(rate.base_rate(), RATE_FLOOR);
        assert_eq!(rate.value(now), RATE_FLOOR);
    }
}
