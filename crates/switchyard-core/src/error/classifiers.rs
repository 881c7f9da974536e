//! Error classification used by the fallback ladder and the pacer

use super::types::SwitchyardError;

impl SwitchyardError {
    /// Whether another attempt against the same candidate may succeed.
    ///
    /// Configuration problems and unrecognized candidates will fail the same
    /// way every time, so the ladder advances past them immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { status_code, .. } => {
                !matches!(status_code, Some(400) | Some(401) | Some(403) | Some(404))
            }
            Self::Timeout { .. } | Self::Cancelled | Self::Io { .. } | Self::Other { .. } => true,
            Self::Config { .. }
            | Self::InvalidCandidate { .. }
            | Self::UnknownProvider { .. }
            | Self::Cache { .. }
            | Self::Json { .. } => false,
        }
    }

    /// Whether the provider signalled rate limiting (429 or equivalent).
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::Provider {
                status_code,
                message,
                ..
            } => {
                if *status_code == Some(429) {
                    return true;
                }
                let message = message.to_lowercase();
                message.contains("rate limit")
                    || message.contains("too many requests")
                    || message.contains("quota exceeded")
            }
            _ => false,
        }
    }

    /// Provider key the error is attributed to, if any
    pub fn provider_name(&self) -> Option<&str> {
        match self {
            Self::Provider { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::InvalidCandidate { provider, .. }
            | Self::UnknownProvider { provider } => Some(provider),
            _ => None,
        }
    }
}
