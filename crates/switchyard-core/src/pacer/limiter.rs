//! Per-provider pacer: concurrency gate + adaptive token bucket

use super::adaptive::AdaptiveRate;
use super::bucket::TokenBucket;
use crate::config::ProviderSettings;
use crate::error::{SwitchyardError, SwitchyardResult};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// Admission counters for observability
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PacerStats {
    /// Calls admitted so far
    pub admitted: u64,
    /// Penalties applied so far
    pub penalties: u64,
    /// Sum of time spent waiting for admission
    pub total_queue_wait: Duration,
    /// Longest single admission wait
    pub max_queue_wait: Duration,
}

impl PacerStats {
    fn record_admission(&mut self, waited: Duration) {
        self.admitted += 1;
        self.total_queue_wait += waited;
        self.max_queue_wait = self.max_queue_wait.max(waited);
    }
}

/// Point-in-time view of a pacer
#[derive(Debug, Clone, Serialize)]
pub struct PacerSnapshot {
    pub provider: String,
    pub base_rate: f64,
    pub current_rate: f64,
    pub tokens: f64,
    pub in_flight: usize,
    pub stats: PacerStats,
}

/// Everything mutated under the per-provider lock
#[derive(Debug)]
struct RateState {
    rate: AdaptiveRate,
    bucket: TokenBucket,
    stats: PacerStats,
}

/// Admission gate for one provider key.
///
/// `acquire` waits for a concurrency slot and then for one token. The slot is
/// returned when the [`PacerPermit`] is dropped; the token is not. A call that
/// fails still spends its share of throughput, so retries cannot bypass the
/// rate.
#[derive(Debug)]
pub struct ProviderPacer {
    provider: String,
    concurrency: usize,
    state: Mutex<RateState>,
    gate: Arc<Semaphore>,
}

impl ProviderPacer {
    pub fn new(provider: impl Into<String>, settings: &ProviderSettings) -> Self {
        let now = Instant::now();
        let concurrency = settings.concurrency.max(1) as usize;
        Self {
            provider: provider.into(),
            concurrency,
            state: Mutex::new(RateState {
                rate: AdaptiveRate::new(settings.rps, now),
                bucket: TokenBucket::new(settings.burst, now),
                stats: PacerStats::default(),
            }),
            gate: Arc::new(Semaphore::new(concurrency)),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Wait for admission.
    ///
    /// Never busy-spins: the concurrency wait parks on the semaphore and the
    /// token wait sleeps exactly until the deficit is refilled. Dropping the
    /// returned future at any point releases whatever slot it held.
    pub async fn acquire(&self) -> SwitchyardResult<PacerPermit> {
        let start = Instant::now();

        let slot = self
            .gate
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| SwitchyardError::other(format!("pacer for {} closed", self.provider)))?;

        loop {
            let wait = {
                let mut state = self.state.lock();
                let now = Instant::now();
                let rate = state.rate.value(now);
                state.bucket.refill(now, rate);
                if state.bucket.try_take() {
                    state.stats.record_admission(now.duration_since(start));
                    None
                } else {
                    Some(state.bucket.deficit_wait(rate))
                }
            };

            match wait {
                None => break,
                Some(wait) => {
                    debug!(
                        provider = %self.provider,
                        wait_ms = wait.as_millis() as u64,
                        "pacer waiting for token"
                    );
                    sleep(wait).await;
                }
            }
        }

        let waited = start.elapsed();
        if waited > Duration::from_millis(5) {
            debug!(
                provider = %self.provider,
                wait_ms = waited.as_millis() as u64,
                "pacer admitted after wait"
            );
        }

        Ok(PacerPermit {
            provider: self.provider.clone(),
            waited,
            _slot: slot,
        })
    }

    /// Throttle this provider after a rate-limit signal
    pub fn penalize(&self, duration: Duration) -> f64 {
        let mut state = self.state.lock();
        let rate = state.rate.penalize(Instant::now(), duration);
        state.stats.penalties += 1;
        warn!(
            provider = %self.provider,
            current_rate = rate,
            penalty_secs = duration.as_secs_f64(),
            "provider penalized"
        );
        rate
    }

    /// Effective rate right now (applies pending recovery)
    pub fn rate(&self) -> f64 {
        self.state.lock().rate.value(Instant::now())
    }

    pub fn base_rate(&self) -> f64 {
        self.state.lock().rate.base_rate()
    }

    /// Tokens available right now
    pub fn available_tokens(&self) -> f64 {
        let mut state = self.state.lock();
        let now = Instant::now();
        let rate = state.rate.value(now);
        state.bucket.refill(now, rate);
        state.bucket.tokens()
    }

    /// Calls currently holding a concurrency slot
    pub fn in_flight(&self) -> usize {
        self.concurrency - self.gate.available_permits()
    }

    pub fn stats(&self) -> PacerStats {
        self.state.lock().stats.clone()
    }

    pub fn snapshot(&self) -> PacerSnapshot {
        let mut state = self.state.lock();
        let now = Instant::now();
        let current_rate = state.rate.value(now);
        state.bucket.refill(now, current_rate);
        PacerSnapshot {
            provider: self.provider.clone(),
            base_rate: state.rate.base_rate(),
            current_rate,
            tokens: state.bucket.tokens(),
            in_flight: self.concurrency - self.gate.available_permits(),
            stats: state.stats.clone(),
        }
    }
}

/// Scoped admission; releases the concurrency slot when dropped
#[derive(Debug)]
pub struct PacerPermit {
    provider: String,
    waited: Duration,
    _slot: OwnedSemaphorePermit,
}

impl PacerPermit {
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Time spent waiting for admission
    pub fn waited(&self) -> Duration {
        self.waited
    }
}
