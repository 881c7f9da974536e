//! Provider adapter contract
//!
//! Adapters translate a normalized message list into one provider's wire
//! format. They report failures as values (`SwitchyardResult`) so the
//! fallback ladder can branch on data rather than unwinding.

use super::messages::ChatMessage;
use super::result::Usage;
use crate::error::SwitchyardResult;
use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// Result of a non-streaming provider call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    pub provider_message_id: Option<String>,
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub latency_ms: f64,
    pub request_id: Option<String>,
    pub raw: serde_json::Value,
}

impl Completion {
    /// A completion carrying only text
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn usage(&self) -> Usage {
        Usage {
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
        }
    }
}

/// Incremental event produced by a streaming provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Time to first token; precedes the first delta
    Meta { ttft_ms: f64 },
    /// A piece of generated text
    Delta { delta: String },
    /// Terminal event
    Done {
        finish_reason: Option<String>,
        usage: Option<Usage>,
    },
}

impl StreamEvent {
    pub fn delta(text: impl Into<String>) -> Self {
        Self::Delta { delta: text.into() }
    }

    pub fn done() -> Self {
        Self::Done {
            finish_reason: None,
            usage: None,
        }
    }
}

/// Event stream as produced by an adapter; may fail mid-way
pub type EventStream = Pin<Box<dyn Stream<Item = SwitchyardResult<StreamEvent>> + Send>>;

/// Event stream after dispatch; always terminated by exactly one `Done`
pub type DispatchStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Capability interface implemented once per provider
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider key this adapter serves (e.g. "openai")
    fn name(&self) -> &str;

    /// Send a non-streaming completion request
    async fn call(
        &self,
        messages: &[ChatMessage],
        model: &str,
        api_key: &str,
    ) -> SwitchyardResult<Completion>;

    /// Send a streaming completion request
    async fn call_streaming(
        &self,
        messages: &[ChatMessage],
        model: &str,
        api_key: &str,
    ) -> SwitchyardResult<EventStream>;
}

/// What a single successful upstream invocation produced
pub enum Invocation {
    Completed(Completion),
    Streaming(DispatchStream),
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed(completion) => f.debug_tuple("Completed").field(completion).finish(),
            Self::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_event_wire_shape() {
        let json = serde_json::to_value(StreamEvent::delta("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "delta", "delta": "hi"}));

        let json = serde_json::to_value(StreamEvent::Meta { ttft_ms: 12.5 }).unwrap();
        assert_eq!(json["type"], "meta");
    }

    #[test]
    fn test_completion_usage() {
        let completion = Completion {
            prompt_tokens: Some(10),
            completion_tokens: Some(4),
            ..Completion::text("hello")
        };
        assert_eq!(completion.usage().total_tokens(), 14);
    }
}
