//! From trait implementations for SwitchyardError conversions

use super::types::SwitchyardError;

impl From<std::io::Error> for SwitchyardError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for SwitchyardError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<toml::de::Error> for SwitchyardError {
    fn from(error: toml::de::Error) -> Self {
        Self::config(format!("Invalid TOML configuration: {}", error))
    }
}
