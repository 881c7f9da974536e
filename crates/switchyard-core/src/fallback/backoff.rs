//! Jittered exponential backoff

use rand::Rng;
use std::time::Duration;

/// Upper bound of the random jitter as a fraction of the delay
pub const JITTER_RATIO: f64 = 0.3;

/// Delay before retry `attempt`: `base * 2^attempt` plus uniform jitter in
/// `[0, 0.3 * delay)`.
///
/// With a 500ms base, attempt 0 lands in `[0.5s, 0.65s)` and attempt 1 in
/// `[1.0s, 1.3s)`.
pub fn jittered_backoff(attempt: u32, base: Duration) -> Duration {
    let delay = base.as_secs_f64() * 2_f64.powi(attempt.min(16) as i32);
    let jitter = if delay > 0.0 {
        let mut rng = rand::thread_rng();
        rng.gen_range(0.0..delay * JITTER_RATIO)
    } else {
        0.0
    };
    Duration::try_from_secs_f64(delay + jitter).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_range() {
        let base = Duration::from_millis(500);
        for _ in 0..200 {
            let delay = jittered_backoff(0, base);
            assert!(delay >= Duration::from_millis(500), "{:?}", delay);
            assert!(delay < Duration::from_millis(650), "{:?}", delay);
        }
    }

    #[test]
    fn test_second_attempt_range() {
        let base = Duration::from_millis(500);
        for _ in 0..200 {
            let delay = jittered_backoff(1, base);
            assert!(delay >= Duration::from_secs(1), "{:?}", delay);
            assert!(delay < Duration::from_millis(1300), "{:?}", delay);
        }
    }

    #[test]
    fn test_zero_base_has_no_delay() {
        assert_eq!(jittered_backoff(3, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_huge_base_saturates() {
        assert_eq!(jittered_backoff(16, Duration::MAX), Duration::MAX);
    }
}
