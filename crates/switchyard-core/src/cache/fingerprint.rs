//! Deterministic cache and de-duplication keys

use crate::fallback::Intent;
use crate::llm::ChatMessage;
use sha2::{Digest, Sha256};

const FIELD_SEP: &[u8] = b"\x1f";
const RECORD_SEP: &[u8] = b"\x1e";

/// Lower-case, trim and collapse internal whitespace
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Prompt-level key: system instructions, the last `top_k` conversational
/// turns, provider and model.
///
/// System messages are compared case- and padding-insensitively; older turns
/// beyond `top_k` do not affect the key.
pub fn prompt_fingerprint(
    messages: &[ChatMessage],
    provider: &str,
    model: &str,
    top_k: usize,
) -> String {
    let (system, turns): (Vec<&ChatMessage>, Vec<&ChatMessage>) =
        messages.iter().partition(|m| m.is_system());
    let recent = &turns[turns.len().saturating_sub(top_k)..];

    let mut hasher = Sha256::new();
    hasher.update(b"prompt");
    for message in system {
        hasher.update(RECORD_SEP);
        hasher.update(message.content.trim().to_lowercase().as_bytes());
    }
    for message in recent {
        hasher.update(RECORD_SEP);
        hasher.update(message.role.to_string().as_bytes());
        hasher.update(FIELD_SEP);
        hasher.update(message.content.as_bytes());
    }
    hasher.update(RECORD_SEP);
    hasher.update(provider.to_lowercase().as_bytes());
    hasher.update(FIELD_SEP);
    hasher.update(model.as_bytes());

    format!("{:x}", hasher.finalize())
}

/// Request-level key: thread, normalized user text and intent
pub fn request_fingerprint(thread_id: Option<&str>, user_text: &str, intent: Intent) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"request");
    hasher.update(RECORD_SEP);
    hasher.update(thread_id.unwrap_or_default().as_bytes());
    hasher.update(FIELD_SEP);
    hasher.update(normalize_text(user_text).as_bytes());
    hasher.update(FIELD_SEP);
    hasher.update(intent.as_str().as_bytes());

    format!("{:x}", hasher.finalize())
}
