//! Core error type for Switchyard

use thiserror::Error;

/// Result type alias for Switchyard operations
pub type SwitchyardResult<T> = Result<T, SwitchyardError>;

/// Main error type for Switchyard
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SwitchyardError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        /// Environment variable or config key that caused the error
        key: Option<String>,
    },

    /// Non-success response from a provider adapter
    #[error("{provider} error: {message}")]
    Provider {
        provider: String,
        message: String,
        status_code: Option<u16>,
    },

    /// A single upstream attempt exceeded its deadline
    #[error("{provider} attempt timed out after {elapsed_ms}ms")]
    Timeout { provider: String, elapsed_ms: u64 },

    /// The requested model is not recognized for the provider
    #[error("Model '{model}' is not recognized for provider '{provider}'")]
    InvalidCandidate { provider: String, model: String },

    /// No adapter is registered under this provider key
    #[error("No adapter registered for provider '{provider}'")]
    UnknownProvider { provider: String },

    /// Cache errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// IO errors
    #[error("IO error: {message}")]
    Io { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// The upstream call was abandoned before producing a result
    #[error("Request was cancelled")]
    Cancelled,

    /// Generic error
    #[error("Error: {message}")]
    Other { message: String },
}
