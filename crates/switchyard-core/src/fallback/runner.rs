//! Ladder execution

use super::backoff::jittered_backoff;
use super::catalog::ModelCatalog;
use super::ladder::LadderEntry;
use crate::config::LadderSettings;
use crate::error::{SwitchyardError, SwitchyardResult};
use crate::llm::{FallbackResult, Invocation};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

/// Retry and deadline policy for one ladder run
#[derive(Debug, Clone, PartialEq)]
pub struct LadderOptions {
    /// Hard deadline for one attempt, admission wait included
    pub attempt_timeout: Duration,
    /// Retries per candidate after its first attempt
    pub max_retries: u32,
    /// Base delay of the jittered backoff between retries
    pub backoff_base: Duration,
}

impl Default for LadderOptions {
    fn default() -> Self {
        LadderOptions::from(&LadderSettings::default())
    }
}

impl From<&LadderSettings> for LadderOptions {
    fn from(settings: &LadderSettings) -> Self {
        Self {
            attempt_timeout: Duration::from_secs(settings.attempt_timeout_secs),
            max_retries: settings.max_retries,
            backoff_base: Duration::from_millis(settings.backoff_base_ms),
        }
    }
}

/// Run `invoke` against `chain` in order until one attempt succeeds.
///
/// Each candidate gets `max_retries + 1` attempts, each under
/// `attempt_timeout`; a timeout counts as an ordinary failure. Candidates whose
/// model the catalog does not recognize are skipped without an attempt, and
/// non-retryable errors advance to the next candidate immediately. When every
/// candidate is exhausted the result carries the last error and no stream.
#[instrument(skip_all, fields(chain_len = chain.len()))]
pub async fn call_with_fallback<F, Fut>(
    invoke: F,
    chain: &[LadderEntry],
    catalog: Option<&ModelCatalog>,
    options: &LadderOptions,
) -> FallbackResult
where
    F: Fn(LadderEntry) -> Fut,
    Fut: Future<Output = SwitchyardResult<Invocation>>,
{
    let mut last_error: Option<SwitchyardError> = None;

    for (index, candidate) in chain.iter().enumerate() {
        let recognized =
            catalog.is_none_or(|catalog| catalog.is_recognized(&candidate.provider, &candidate.model));
        if !recognized {
            let error = SwitchyardError::invalid_candidate(&candidate.provider, &candidate.model);
            warn!(
                provider = %candidate.provider,
                model = %candidate.model,
                "skipping candidate: {}",
                error
            );
            last_error = Some(error);
            continue;
        }

        for attempt in 0..=options.max_retries {
            if attempt > 0 {
                let delay = jittered_backoff(attempt, options.backoff_base);
                debug!(
                    provider = %candidate.provider,
                    attempt,
                    delay_secs = delay.as_secs_f64(),
                    "backing off before retry"
                );
                sleep(delay).await;
            }

            let started = Instant::now();
            let outcome = match timeout(options.attempt_timeout, invoke(candidate.clone())).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SwitchyardError::timeout(
                    &candidate.provider,
                    options.attempt_timeout,
                )),
            };

            match outcome {
                Ok(invocation) => {
                    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                    if index > 0 || attempt > 0 {
                        info!(
                            provider = %candidate.provider,
                            model = %candidate.model,
                            reason = %candidate.reason,
                            candidate = index,
                            attempt,
                            "fallback succeeded"
                        );
                    }
                    return FallbackResult::from_invocation(
                        &candidate.provider,
                        &candidate.model,
                        invocation,
                        latency_ms,
                        index > 0,
                    );
                }
                Err(err) => {
                    warn!(
                        provider = %candidate.provider,
                        model = %candidate.model,
                        attempt = attempt + 1,
                        max_attempts = options.max_retries + 1,
                        error = %err,
                        "attempt failed"
                    );
                    let retryable = err.is_retryable();
                    last_error = Some(err);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        if let Some(next) = chain.get(index + 1) {
            info!(
                from = %candidate,
                to = %next,
                reason = %next.reason,
                "advancing fallback ladder"
            );
        }
    }

    let message = last_error
        .map(|err| err.to_string())
        .unwrap_or_else(|| "fallback chain is empty".to_string());
    error!(candidates = chain.len(), error = %message, "all candidates exhausted");
    FallbackResult::failure(message)
}
