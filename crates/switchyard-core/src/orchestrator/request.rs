//! Dispatch request and the values relayed through the hub and cache

use crate::fallback::Intent;
use crate::llm::{ChatMessage, Completion, FallbackResult, Invocation, Usage};
use serde::{Deserialize, Serialize};

/// One logical request from application code
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub messages: Vec<ChatMessage>,
    pub intent: Intent,
    /// Conversation scope for de-duplication and caching
    pub thread_id: Option<String>,
    pub streaming: bool,
    pub cacheable: bool,
}

impl DispatchRequest {
    pub fn new(messages: Vec<ChatMessage>, intent: impl Into<Intent>) -> Self {
        Self {
            messages,
            intent: intent.into(),
            thread_id: None,
            streaming: false,
            cacheable: true,
        }
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cacheable = cacheable;
        self
    }
}

/// What the dispatch worker broadcasts to every subscriber of a request
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// Sent once, before any chunk
    Header {
        provider: String,
        model: String,
        fallback_used: bool,
        latency_ms: f64,
        usage: Usage,
        raw: serde_json::Value,
    },
    Chunk(String),
    /// Every candidate failed; carries the last error
    Failed(String),
}

/// A completed response as stored in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub provider: String,
    pub model: String,
    pub content: String,
    pub usage: Usage,
    pub raw: serde_json::Value,
}

impl CachedResponse {
    /// `raw` with a `cached: true` marker
    fn marked_raw(&self) -> serde_json::Value {
        match &self.raw {
            serde_json::Value::Object(map) => {
                let mut map = map.clone();
                map.insert("cached".to_string(), serde_json::Value::Bool(true));
                serde_json::Value::Object(map)
            }
            _ => serde_json::json!({ "cached": true }),
        }
    }

    pub fn to_completion(&self) -> Completion {
        Completion {
            content: self.content.clone(),
            prompt_tokens: self.usage.prompt_tokens,
            completion_tokens: self.usage.completion_tokens,
            raw: self.marked_raw(),
            ..Default::default()
        }
    }

    /// One-chunk result for a cache hit
    pub fn into_result(self) -> FallbackResult {
        let completion = self.to_completion();
        FallbackResult::from_invocation(
            self.provider,
            self.model,
            Invocation::Completed(completion),
            0.0,
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = DispatchRequest::new(vec![ChatMessage::user("hi")], "coding help")
            .with_thread("t-1")
            .streaming(true)
            .cacheable(false);
        assert_eq!(request.intent, Intent::Coding);
        assert_eq!(request.thread_id.as_deref(), Some("t-1"));
        assert!(request.streaming);
        assert!(!request.cacheable);
    }

    #[tokio::test]
    async fn test_cache_hit_result_is_marked() {
        let cached = CachedResponse {
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            content: "answer".to_string(),
            usage: Usage {
                prompt_tokens: Some(3),
                completion_tokens: Some(1),
            },
            raw: serde_json::json!({ "id": "abc" }),
        };

        let mut result = cached.into_result();
        assert_eq!(result.raw["cached"], true);
        assert_eq!(result.raw["id"], "abc");
        assert_eq!(result.usage.total_tokens(), 4);
        assert!(!result.fallback_used);
        assert_eq!(result.collect_text().await, "answer");
    }
}
