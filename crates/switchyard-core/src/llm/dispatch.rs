//! Provider lookup and call dispatch

use super::messages::ChatMessage;
use super::provider::{DispatchStream, EventStream, Invocation, ProviderAdapter, StreamEvent};
use crate::config::SwitchyardConfig;
use crate::error::{SwitchyardError, SwitchyardResult};
use futures::{StreamExt, stream};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lookup table from provider key to adapter implementation.
///
/// Adding a provider means registering another adapter here.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own name, replacing any previous one
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) -> Option<Arc<dyn ProviderAdapter>> {
        let key = adapter.name().to_lowercase();
        self.adapters.insert(key, adapter)
    }

    /// Builder-style registration
    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, provider: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&provider.to_lowercase()).cloned()
    }

    /// Registered provider keys, sorted
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.adapters.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}

/// Routes a (provider, model) pair to its adapter
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: AdapterRegistry,
    config: Arc<SwitchyardConfig>,
}

impl Dispatcher {
    pub fn new(registry: AdapterRegistry, config: Arc<SwitchyardConfig>) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Perform one upstream call.
    ///
    /// A streaming invocation is wrapped so that it always ends with exactly
    /// one `Done` event, whatever the adapter does after it starts.
    pub async fn call(
        &self,
        provider: &str,
        model: &str,
        messages: &[ChatMessage],
        streaming: bool,
    ) -> SwitchyardResult<Invocation> {
        let adapter = self
            .registry
            .get(provider)
            .ok_or_else(|| SwitchyardError::unknown_provider(provider))?;
        let api_key = self.config.api_key(provider).unwrap_or_default();

        if streaming {
            let events = adapter.call_streaming(messages, model, api_key).await?;
            Ok(Invocation::Streaming(terminated(provider.to_string(), events)))
        } else {
            let completion = adapter.call(messages, model, api_key).await?;
            debug!(
                provider,
                model,
                latency_ms = completion.latency_ms,
                "completion received"
            );
            Ok(Invocation::Completed(completion))
        }
    }
}

/// Wrap an adapter stream so it terminates with exactly one `Done`.
///
/// Errors after the stream started are logged and turn into the terminal event;
/// a stream that ends without `Done` gets one synthesized.
pub(crate) fn terminated(provider: String, events: EventStream) -> DispatchStream {
    let state = Some(events);
    Box::pin(stream::unfold(state, move |state| {
        let provider = provider.clone();
        async move {
            let mut events = state?;
            match events.next().await {
                Some(Ok(event @ StreamEvent::Done { .. })) => Some((event, None)),
                Some(Ok(event)) => {
                    if let StreamEvent::Meta { ttft_ms } = &event {
                        debug!(provider = %provider, ttft_ms, "first token");
                    }
                    Some((event, Some(events)))
                }
                Some(Err(error)) => {
                    warn!(provider = %provider, error = %error, "stream failed mid-flight, closing");
                    Some((
                        StreamEvent::Done {
                            finish_reason: Some("error".to_string()),
                            usage: None,
                        },
                        None,
                    ))
                }
                None => Some((StreamEvent::done(), None)),
            }
        }
    }))
}
