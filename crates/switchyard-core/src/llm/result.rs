//! The single normalized result shape returned to callers

use super::provider::{Invocation, StreamEvent};
use futures::{Stream, StreamExt, stream};
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Asynchronous sequence of text chunks
pub type ChunkStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Token usage reported by a provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens
            .unwrap_or(0)
            .saturating_add(self.completion_tokens.unwrap_or(0))
    }
}

/// Outcome of a dispatch, successful or not.
///
/// Streaming and non-streaming calls share this shape: `stream` always yields
/// text chunks (exactly one for a non-streaming call). Total failure is a
/// normal value with `error` set and no stream, so callers branch on `error`
/// instead of handling an `Err`.
pub struct FallbackResult {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub stream: Option<ChunkStream>,
    pub usage: Usage,
    pub raw: serde_json::Value,
    pub latency_ms: f64,
    pub error: Option<String>,
    pub fallback_used: bool,
}

impl FallbackResult {
    /// Normalize a successful invocation
    pub fn from_invocation(
        provider: impl Into<String>,
        model: impl Into<String>,
        invocation: Invocation,
        latency_ms: f64,
        fallback_used: bool,
    ) -> Self {
        let (stream, usage, raw): (ChunkStream, Usage, serde_json::Value) = match invocation {
            Invocation::Completed(completion) => {
                let usage = completion.usage();
                let raw = completion.raw.clone();
                (Box::pin(stream::iter([completion.content])), usage, raw)
            }
            Invocation::Streaming(events) => {
                let chunks = events.filter_map(|event| async move {
                    match event {
                        StreamEvent::Delta { delta } => Some(delta),
                        StreamEvent::Meta { .. } | StreamEvent::Done { .. } => None,
                    }
                });
                (Box::pin(chunks), Usage::default(), serde_json::Value::Null)
            }
        };

        Self {
            provider: Some(provider.into()),
            model: Some(model.into()),
            stream: Some(stream),
            usage,
            raw,
            latency_ms,
            error: None,
            fallback_used,
        }
    }

    /// A result for a dispatch that produced no content
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            provider: None,
            model: None,
            stream: None,
            usage: Usage::default(),
            raw: serde_json::Value::Null,
            latency_ms: 0.0,
            error: Some(error.into()),
            fallback_used: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.stream.is_some()
    }

    /// Drain the stream and concatenate its chunks.
    ///
    /// Returns an empty string when there is no stream or it was already taken.
    pub async fn collect_text(&mut self) -> String {
        match self.stream.take() {
            Some(stream) => stream.collect::<Vec<_>>().await.concat(),
            None => String::new(),
        }
    }
}

impl std::fmt::Debug for FallbackResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackResult")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("stream", &self.stream.as_ref().map(|_| ".."))
            .field("usage", &self.usage)
            .field("latency_ms", &self.latency_ms)
            .field("error", &self.error)
            .field("fallback_used", &self.fallback_used)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::Completion;

    #[tokio::test]
    async fn test_completed_invocation_yields_single_chunk() {
        let completion = Completion {
            prompt_tokens: Some(3),
            completion_tokens: Some(2),
            ..Completion::text("whole answer")
        };
        let mut result =
            FallbackResult::from_invocation("openai", "gpt-4o", Invocation::Completed(completion), 12.0, false);

        assert!(result.is_success());
        assert_eq!(result.usage.total_tokens(), 5);
        let chunks: Vec<String> = result.stream.take().unwrap().collect().await;
        assert_eq!(chunks, vec!["whole answer".to_string()]);
    }

    #[tokio::test]
    async fn test_streaming_invocation_keeps_only_deltas() {
        let events = stream::iter(vec![
            StreamEvent::Meta { ttft_ms: 5.0 },
            StreamEvent::delta("Hel"),
            StreamEvent::delta("lo"),
            StreamEvent::done(),
        ]);
        let mut result = FallbackResult::from_invocation(
            "anthropic",
            "claude-3-5-haiku-latest",
            Invocation::Streaming(Box::pin(events)),
            8.0,
            true,
        );

        assert!(result.fallback_used);
        assert_eq!(result.collect_text().await, "Hello");
        assert_eq!(result.collect_text().await, "");
    }

    #[test]
    fn test_total_tokens_saturates() {
        let usage = Usage {
            prompt_tokens: Some(u32::MAX),
            completion_tokens: Some(10),
        };
        assert_eq!(usage.total_tokens(), u32::MAX);
    }

    #[test]
    fn test_failure_shape() {
        let result = FallbackResult::failure("all providers failed");
        assert!(!result.is_success());
        assert!(result.stream.is_none());
        assert!(result.provider.is_none());
        assert_eq!(result.error.as_deref(), Some("all providers failed"));
    }
}
