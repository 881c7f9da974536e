//! Typed configuration sections and their defaults

use crate::error::{SwitchyardError, SwitchyardResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Providers configured when `SWITCHYARD_PROVIDERS` is not set
pub const DEFAULT_PROVIDERS: &[&str] = &["openai", "anthropic", "google", "openrouter"];

/// Longest accepted penalty, TTL or attempt window (one year)
pub const MAX_WINDOW_SECS: u64 = 365 * 24 * 60 * 60;

/// Longest accepted backoff base
pub const MAX_BACKOFF_BASE_MS: u64 = 60_000;

/// Pacing and credentials for one provider key
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Sustained requests per second under normal conditions
    #[serde(default = "default_rps")]
    pub rps: f64,
    /// Token bucket capacity
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Maximum simultaneously in-flight upstream calls
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
    /// API key handed to the adapter; never serialized back out
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_rps() -> f64 {
    1.0
}
fn default_burst() -> u32 {
    2
}
fn default_concurrency() -> u32 {
    3
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            rps: default_rps(),
            burst: default_burst(),
            concurrency: default_concurrency(),
            api_key: None,
        }
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("rps", &self.rps)
            .field("burst", &self.burst)
            .field("concurrency", &self.concurrency)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ProviderSettings {
    pub fn new(rps: f64, burst: u32, concurrency: u32) -> Self {
        Self {
            rps,
            burst,
            concurrency,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Response cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Default entry lifetime
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    /// Entry count that triggers a purge of expired entries
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
    /// Conversational turns kept when fingerprinting a prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_cache_ttl() -> u64 {
    3600
}
fn default_cache_max_entries() -> usize {
    10_000
}
fn default_top_k() -> usize {
    6
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            max_entries: default_cache_max_entries(),
            top_k: default_top_k(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Stream hub settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    /// How long a session stays shareable after creation or completion
    #[serde(default = "default_stream_ttl")]
    pub ttl_secs: u64,
    /// Bounded capacity of every subscriber queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_stream_ttl() -> u64 {
    30
}
fn default_queue_capacity() -> usize {
    1024
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_stream_ttl(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl StreamSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Fallback ladder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderSettings {
    /// Hard deadline for one attempt, admission wait included
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,
    /// Retries per candidate after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay of the jittered exponential backoff
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,
}

fn default_attempt_timeout() -> u64 {
    45
}
fn default_max_retries() -> u32 {
    1
}
fn default_backoff_base() -> u64 {
    500
}

impl Default for LadderSettings {
    fn default() -> Self {
        Self {
            attempt_timeout_secs: default_attempt_timeout(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base(),
        }
    }
}

/// Complete Switchyard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchyardConfig {
    /// Per-provider pacing, keyed by lower-cased provider name
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSettings>,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub stream: StreamSettings,
    #[serde(default)]
    pub ladder: LadderSettings,
    /// Penalty window applied when a provider signals rate limiting
    #[serde(default = "default_penalty_secs")]
    pub penalty_secs: u64,
}

fn default_penalty_secs() -> u64 {
    60
}

impl Default for SwitchyardConfig {
    fn default() -> Self {
        Self {
            providers: BTreeMap::new(),
            cache: CacheSettings::default(),
            stream: StreamSettings::default(),
            ladder: LadderSettings::default(),
            penalty_secs: default_penalty_secs(),
        }
    }
}

impl SwitchyardConfig {
    /// Settings for a provider, falling back to defaults when unconfigured
    pub fn provider(&self, name: &str) -> ProviderSettings {
        self.providers
            .get(&name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    pub fn api_key(&self, name: &str) -> Option<&str> {
        self.providers
            .get(&name.to_lowercase())
            .and_then(|p| p.api_key.as_deref())
    }

    /// Add or replace one provider's settings
    pub fn with_provider(mut self, name: &str, settings: ProviderSettings) -> Self {
        self.providers.insert(name.to_lowercase(), settings);
        self
    }

    pub fn penalty(&self) -> Duration {
        Duration::from_secs(self.penalty_secs)
    }

    /// Reject values the pacer cannot work with
    pub fn validate(&self) -> SwitchyardResult<()> {
        for (name, settings) in &self.providers {
            if !settings.rps.is_finite() || settings.rps <= 0.0 {
                return Err(SwitchyardError::config_key(
                    format!("rps must be positive, got {}", settings.rps),
                    format!("{}.rps", name),
                ));
            }
            if settings.burst == 0 {
                return Err(SwitchyardError::config_key(
                    "burst must be at least 1",
                    format!("{}.burst", name),
                ));
            }
            if settings.concurrency == 0 {
                return Err(SwitchyardError::config_key(
                    "concurrency must be at least 1",
                    format!("{}.concurrency", name),
                ));
            }
        }
        if self.stream.queue_capacity == 0 {
            return Err(SwitchyardError::config_key(
                "queue capacity must be at least 1",
                "stream.queue_capacity",
            ));
        }

        let windows = [
            ("penalty_secs", self.penalty_secs),
            ("cache.ttl_secs", self.cache.ttl_secs),
            ("stream.ttl_secs", self.stream.ttl_secs),
            ("ladder.attempt_timeout_secs", self.ladder.attempt_timeout_secs),
        ];
        for (key, secs) in windows {
            if secs > MAX_WINDOW_SECS {
                return Err(SwitchyardError::config_key(
                    format!("{} must be at most {}s, got {}", key, MAX_WINDOW_SECS, secs),
                    key,
                ));
            }
        }
        if self.ladder.backoff_base_ms > MAX_BACKOFF_BASE_MS {
            return Err(SwitchyardError::config_key(
                format!(
                    "backoff base must be at most {}ms, got {}",
                    MAX_BACKOFF_BASE_MS, self.ladder.backoff_base_ms
                ),
                "ladder.backoff_base_ms",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_provider_gets_defaults() {
        let config = SwitchyardConfig::default();
        let settings = config.provider("mystery");
        assert_eq!(settings.rps, 1.0);
        assert_eq!(settings.burst, 2);
        assert_eq!(settings.concurrency, 3);
    }

    #[test]
    fn test_provider_lookup_is_case_insensitive() {
        let config = SwitchyardConfig::default()
            .with_provider("OpenAI", ProviderSettings::new(5.0, 4, 8).with_api_key("sk-1"));
        assert_eq!(config.provider("openai").burst, 4);
        assert_eq!(config.api_key("OPENAI"), Some("sk-1"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let settings = ProviderSettings::default().with_api_key("sk-secret");
        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config =
            SwitchyardConfig::default().with_provider("openai", ProviderSettings::new(0.0, 2, 3));
        assert!(config.validate().is_err());

        let config =
            SwitchyardConfig::default().with_provider("openai", ProviderSettings::new(1.0, 0, 3));
        assert!(config.validate().is_err());

        let config =
            SwitchyardConfig::default().with_provider("openai", ProviderSettings::new(1.0, 2, 0));
        assert!(config.validate().is_err());

        assert!(SwitchyardConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_windows() {
        let config = SwitchyardConfig {
            penalty_secs: u64::MAX,
            ..SwitchyardConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("penalty_secs"), "{}", err);

        let mut config = SwitchyardConfig::default();
        config.cache.ttl_secs = MAX_WINDOW_SECS + 1;
        assert!(config.validate().is_err());

        let mut config = SwitchyardConfig::default();
        config.stream.ttl_secs = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = SwitchyardConfig::default();
        config.ladder.backoff_base_ms = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = SwitchyardConfig::default();
        config.penalty_secs = MAX_WINDOW_SECS;
        config.ladder.backoff_base_ms = MAX_BACKOFF_BASE_MS;
        assert!(config.validate().is_ok());
    }
}
