//! Orchestrator context and dispatch flow

use super::request::{CachedResponse, DispatchRequest, RelayEvent};
use crate::cache::{CacheStatistics, ResponseCache, prompt_fingerprint, request_fingerprint};
use crate::config::SwitchyardConfig;
use crate::error::SwitchyardResult;
use crate::fallback::{Ladder, LadderEntry, LadderOptions, call_with_fallback};
use crate::llm::messages::last_user_text;
use crate::llm::{
    AdapterRegistry, ChatMessage, Dispatcher, FallbackResult, Invocation, StreamEvent, Usage,
};
use crate::pacer::{PacerRegistry, PacerSnapshot};
use crate::stream_hub::{Finisher, StreamHub};
use futures::{Stream, StreamExt, future};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{Instrument, debug, info_span, warn};

/// Shared state behind every clone of an [`Orchestrator`]
struct Inner {
    config: Arc<SwitchyardConfig>,
    pacers: PacerRegistry,
    hub: StreamHub<RelayEvent>,
    cache: ResponseCache<CachedResponse>,
    dispatcher: Dispatcher,
    ladder: Ladder,
    options: LadderOptions,
}

/// What the worker learns from the upstream stream it drains
#[derive(Debug, Default)]
struct StreamOutcome {
    /// Upstream errored or stalled; the answer is partial
    failed: AtomicBool,
    /// Usage reported by the terminal event
    usage: Mutex<Option<Usage>>,
}

/// Owner-side fan-out.
///
/// The requester reads an unbounded relay so its own answer is never
/// truncated; followers read their bounded hub queues.
struct Relay {
    requester: mpsc::UnboundedSender<RelayEvent>,
    finisher: Finisher<RelayEvent>,
}

impl Relay {
    fn send(&self, event: RelayEvent) {
        // The requester may have stopped listening
        let _ = self.requester.send(event.clone());
        self.finisher.publish(event);
    }

    /// Close the session for followers, then the requester's relay
    fn finish(self) {
        self.finisher.finish();
    }
}

/// Entry point for application code.
///
/// Construct one per process and clone it freely; clones share all state.
/// [`Orchestrator::dispatch`] never fails for provider reasons: total failure
/// comes back as a [`FallbackResult`] with `error` set.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Build with the default ladder
    pub fn new(config: SwitchyardConfig, adapters: AdapterRegistry) -> SwitchyardResult<Self> {
        Self::with_ladder(config, adapters, Ladder::default())
    }

    pub fn with_ladder(
        config: SwitchyardConfig,
        adapters: AdapterRegistry,
        ladder: Ladder,
    ) -> SwitchyardResult<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let inner = Inner {
            pacers: PacerRegistry::new(Arc::clone(&config)),
            hub: StreamHub::from_settings(&config.stream),
            cache: ResponseCache::from_settings(&config.cache),
            dispatcher: Dispatcher::new(adapters, Arc::clone(&config)),
            options: LadderOptions::from(&config.ladder),
            ladder,
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn config(&self) -> &SwitchyardConfig {
        &self.inner.config
    }

    pub fn ladder(&self) -> &Ladder {
        &self.inner.ladder
    }

    pub fn pacers(&self) -> &PacerRegistry {
        &self.inner.pacers
    }

    pub fn hub(&self) -> &StreamHub<RelayEvent> {
        &self.inner.hub
    }

    pub fn cache(&self) -> &ResponseCache<CachedResponse> {
        &self.inner.cache
    }

    pub fn pacer_snapshot(&self) -> Vec<PacerSnapshot> {
        self.inner.pacers.snapshot()
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.inner.cache.statistics()
    }

    /// Drop pacer state, hub sessions and cached responses
    pub fn reset(&self) {
        self.inner.pacers.reset();
        self.inner.hub.reset();
        self.inner.cache.reset();
    }

    /// Serve one request.
    ///
    /// A cached answer is returned directly. Otherwise the request joins the
    /// in-flight call for the same key, or starts one on a background task
    /// that outlives this future, so a caller going away does not cancel the
    /// call for anyone else.
    pub async fn dispatch(&self, request: DispatchRequest) -> FallbackResult {
        let user_text = last_user_text(&request.messages).unwrap_or_default();
        let key = request_fingerprint(request.thread_id.as_deref(), user_text, request.intent);

        if request.cacheable {
            if let Some(hit) = self.inner.cache.get(&key) {
                debug!(intent = %request.intent, "request served from cache");
                return hit.into_result();
            }
        }

        let mut subscription = self.inner.hub.subscribe(&key);
        match subscription.take_finisher() {
            Some(finisher) => {
                let (requester, events) = mpsc::unbounded_channel();
                // The owner's hub queue is unused; it is pruned on the next publish
                drop(subscription);

                let inner = Arc::clone(&self.inner);
                let span = info_span!("dispatch", intent = %request.intent, streaming = request.streaming);
                let relay = Relay { requester, finisher };
                tokio::spawn(inner.run(request, key, relay).instrument(span));

                relay_result(UnboundedReceiverStream::new(events)).await
            }
            None => {
                debug!(intent = %request.intent, "joined in-flight request");
                relay_result(subscription.into_items()).await
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("providers", &self.inner.dispatcher.registry().providers())
            .field("pacers", &self.inner.pacers.len())
            .field("sessions", &self.inner.hub.session_count())
            .field("cached", &self.inner.cache.len())
            .finish()
    }
}

impl Inner {
    /// Owner side: run the ladder and broadcast the outcome
    async fn run(self: Arc<Self>, request: DispatchRequest, key: String, relay: Relay) {
        let messages = Arc::new(request.messages);
        let outcome = Arc::new(StreamOutcome::default());
        let chain = self.ladder.chain_for(request.intent).to_vec();

        let invoke = |candidate: LadderEntry| {
            Arc::clone(&self).attempt(
                candidate,
                Arc::clone(&messages),
                request.streaming,
                request.cacheable,
                Arc::clone(&outcome),
            )
        };
        let mut result = call_with_fallback(
            invoke,
            &chain,
            Some(self.ladder.catalog()),
            &self.options,
        )
        .await;

        let (Some(provider), Some(model)) = (result.provider.clone(), result.model.clone()) else {
            let error = result
                .error
                .unwrap_or_else(|| "dispatch produced no result".to_string());
            relay.send(RelayEvent::Failed(error));
            relay.finish();
            return;
        };

        relay.send(RelayEvent::Header {
            provider: provider.clone(),
            model: model.clone(),
            fallback_used: result.fallback_used,
            latency_ms: result.latency_ms,
            usage: result.usage.clone(),
            raw: result.raw.clone(),
        });

        let mut content = String::new();
        if let Some(mut chunks) = result.stream.take() {
            // Every chunk must arrive within the attempt timeout
            loop {
                match tokio::time::timeout(self.options.attempt_timeout, chunks.next()).await {
                    Ok(Some(chunk)) => {
                        content.push_str(&chunk);
                        relay.send(RelayEvent::Chunk(chunk));
                    }
                    Ok(None) => break,
                    Err(_) => {
                        warn!(
                            provider = %provider,
                            timeout = ?self.options.attempt_timeout,
                            "upstream stream stalled, closing it"
                        );
                        outcome.failed.store(true, Ordering::SeqCst);
                        break;
                    }
                }
            }
            // Dropping the stream releases the pacer permit it carries
            drop(chunks);
        }

        if outcome.failed.load(Ordering::SeqCst) {
            warn!(provider = %provider, "stream ended with an error, not caching");
        } else if request.cacheable {
            let usage = outcome.usage.lock().take().unwrap_or(result.usage);
            let prompt_key = prompt_fingerprint(&messages, &provider, &model, self.config.cache.top_k);
            let cached = CachedResponse {
                provider,
                model,
                content,
                usage,
                raw: result.raw,
            };
            self.cache.set(prompt_key, cached.clone(), None);
            self.cache.set(key, cached, None);
        }

        relay.finish();
    }

    /// One ladder attempt: prompt cache, pacer admission, upstream call
    async fn attempt(
        self: Arc<Self>,
        candidate: LadderEntry,
        messages: Arc<Vec<ChatMessage>>,
        streaming: bool,
        cacheable: bool,
        outcome: Arc<StreamOutcome>,
    ) -> SwitchyardResult<Invocation> {
        if cacheable {
            let prompt_key = prompt_fingerprint(
                &messages,
                &candidate.provider,
                &candidate.model,
                self.config.cache.top_k,
            );
            if let Some(hit) = self.cache.get(&prompt_key) {
                debug!(provider = %candidate.provider, model = %candidate.model, "prompt served from cache");
                return Ok(Invocation::Completed(hit.to_completion()));
            }
        }

        let pacer = self.pacers.get(&candidate.provider);
        let permit = pacer.acquire().await?;

        let response = self
            .dispatcher
            .call(&candidate.provider, &candidate.model, &messages, streaming)
            .await;

        match response {
            Ok(Invocation::Streaming(events)) => {
                // The permit rides along with the stream until it is dropped
                let events = events.inspect(move |event| {
                    let _admitted = &permit;
                    if let StreamEvent::Done {
                        finish_reason,
                        usage,
                    } = event
                    {
                        if finish_reason.as_deref() == Some("error") {
                            outcome.failed.store(true, Ordering::SeqCst);
                        }
                        if let Some(usage) = usage {
                            *outcome.usage.lock() = Some(usage.clone());
                        }
                    }
                });
                Ok(Invocation::Streaming(Box::pin(events)))
            }
            Ok(completed) => Ok(completed),
            Err(error) => {
                if error.is_rate_limited() {
                    self.pacers
                        .penalize(&candidate.provider, self.config.penalty());
                }
                Err(error)
            }
        }
    }
}

/// Turn relayed events into a result; requester and followers alike
async fn relay_result<S>(events: S) -> FallbackResult
where
    S: Stream<Item = RelayEvent> + Send + 'static,
{
    let mut events = Box::pin(events);

    match events.next().await {
        Some(RelayEvent::Header {
            provider,
            model,
            fallback_used,
            latency_ms,
            usage,
            raw,
        }) => {
            let chunks = events.filter_map(|event| {
                future::ready(match event {
                    RelayEvent::Chunk(chunk) => Some(chunk),
                    RelayEvent::Header { .. } | RelayEvent::Failed(_) => None,
                })
            });
            FallbackResult {
                provider: Some(provider),
                model: Some(model),
                stream: Some(Box::pin(chunks)),
                usage,
                raw,
                latency_ms,
                error: None,
                fallback_used,
            }
        }
        Some(RelayEvent::Failed(error)) => FallbackResult::failure(error),
        Some(RelayEvent::Chunk(_)) => FallbackResult::failure("relay lost the response header"),
        None => FallbackResult::failure("dispatch ended without a result"),
    }
}
