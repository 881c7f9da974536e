//! Constructor methods for SwitchyardError

use super::types::SwitchyardError;
use std::time::Duration;

impl SwitchyardError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: None,
        }
    }

    /// Create a configuration error naming the offending key
    pub fn config_key(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Create a provider error without a status code
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a provider error carrying the HTTP status returned upstream
    pub fn provider_status(
        provider: impl Into<String>,
        status_code: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a rate-limit (429) provider error
    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self::provider_status(provider, 429, "rate limit exceeded")
    }

    /// Create a per-attempt timeout error
    pub fn timeout(provider: impl Into<String>, elapsed: Duration) -> Self {
        Self::Timeout {
            provider: provider.into(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn invalid_candidate(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self::InvalidCandidate {
            provider: provider.into(),
            model: model.into(),
        }
    }

    pub fn unknown_provider(provider: impl Into<String>) -> Self {
        Self::UnknownProvider {
            provider: provider.into(),
        }
    }

    /// Create a new cache error
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a new IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}
