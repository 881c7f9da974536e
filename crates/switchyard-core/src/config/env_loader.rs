//! Environment variable-based configuration loading

use super::settings::{DEFAULT_PROVIDERS, ProviderSettings, SwitchyardConfig};
use crate::error::{SwitchyardError, SwitchyardResult};
use std::str::FromStr;
use tracing::debug;

/// Load configuration from environment variables
///
/// A `.env` file in the working directory is read first when present.
/// Per-provider variables use the upper-cased provider name as prefix
/// (`OPENAI_RPS`, `OPENAI_BURST`, `OPENAI_CONCURRENCY`, `OPENAI_API_KEY`);
/// global settings use the `SWITCHYARD_` prefix.
pub fn load_from_env() -> SwitchyardResult<SwitchyardConfig> {
    if dotenv::dotenv().is_ok() {
        debug!("loaded variables from .env");
    }
    load_from_lookup(|key| std::env::var(key).ok())
}

/// Load configuration through an arbitrary variable lookup
pub fn load_from_lookup<F>(lookup: F) -> SwitchyardResult<SwitchyardConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = SwitchyardConfig::default();

    let providers: Vec<String> = match lookup("SWITCHYARD_PROVIDERS") {
        Some(list) => list
            .split(',')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect(),
        None => DEFAULT_PROVIDERS.iter().map(|p| p.to_string()).collect(),
    };

    for provider in providers {
        let prefix = provider.to_uppercase().replace('-', "_");
        let mut settings = ProviderSettings::default();

        if let Some(rps) = parse_var(&lookup, &format!("{}_RPS", prefix))? {
            settings.rps = rps;
        }
        if let Some(burst) = parse_var(&lookup, &format!("{}_BURST", prefix))? {
            settings.burst = burst;
        }
        if let Some(concurrency) = parse_var(&lookup, &format!("{}_CONCURRENCY", prefix))? {
            settings.concurrency = concurrency;
        }
        settings.api_key = lookup(&format!("{}_API_KEY", prefix)).filter(|k| !k.is_empty());

        config.providers.insert(provider, settings);
    }

    if let Some(ttl) = parse_var(&lookup, "SWITCHYARD_CACHE_TTL_SECS")? {
        config.cache.ttl_secs = ttl;
    }
    if let Some(max_entries) = parse_var(&lookup, "SWITCHYARD_CACHE_MAX_ENTRIES")? {
        config.cache.max_entries = max_entries;
    }
    if let Some(top_k) = parse_var(&lookup, "SWITCHYARD_CACHE_TOP_K")? {
        config.cache.top_k = top_k;
    }
    if let Some(ttl) = parse_var(&lookup, "SWITCHYARD_STREAM_TTL_SECS")? {
        config.stream.ttl_secs = ttl;
    }
    if let Some(timeout) = parse_var(&lookup, "SWITCHYARD_ATTEMPT_TIMEOUT_SECS")? {
        config.ladder.attempt_timeout_secs = timeout;
    }
    if let Some(retries) = parse_var(&lookup, "SWITCHYARD_MAX_RETRIES")? {
        config.ladder.max_retries = retries;
    }
    if let Some(penalty) = parse_var(&lookup, "SWITCHYARD_PENALTY_SECS")? {
        config.penalty_secs = penalty;
    }

    config.validate()?;
    Ok(config)
}

fn parse_var<T, F>(lookup: &F, key: &str) -> SwitchyardResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            SwitchyardError::config_key(format!("Invalid {} value '{}'", key, raw), key)
        }),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = load_from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.providers.len(), DEFAULT_PROVIDERS.len());
        assert_eq!(config.provider("openai"), ProviderSettings::default());
        assert_eq!(config.cache.ttl_secs, 3600);
        assert_eq!(config.penalty_secs, 60);
    }

    #[test]
    fn test_provider_triples() {
        let config = load_from_lookup(lookup_from(&[
            ("SWITCHYARD_PROVIDERS", "openai, mistral"),
            ("OPENAI_RPS", "2.5"),
            ("OPENAI_BURST", "4"),
            ("OPENAI_CONCURRENCY", "6"),
            ("OPENAI_API_KEY", "sk-test"),
            ("MISTRAL_RPS", "0.5"),
        ]))
        .unwrap();

        assert_eq!(config.providers.len(), 2);
        let openai = config.provider("openai");
        assert_eq!(openai.rps, 2.5);
        assert_eq!(openai.burst, 4);
        assert_eq!(openai.concurrency, 6);
        assert_eq!(config.api_key("openai"), Some("sk-test"));

        let mistral = config.provider("mistral");
        assert_eq!(mistral.rps, 0.5);
        assert_eq!(mistral.burst, 2);
        assert_eq!(config.api_key("mistral"), None);
    }

    #[test]
    fn test_global_settings() {
        let config = load_from_lookup(lookup_from(&[
            ("SWITCHYARD_CACHE_TTL_SECS", "120"),
            ("SWITCHYARD_CACHE_TOP_K", "3"),
            ("SWITCHYARD_STREAM_TTL_SECS", "5"),
            ("SWITCHYARD_ATTEMPT_TIMEOUT_SECS", "10"),
            ("SWITCHYARD_MAX_RETRIES", "2"),
            ("SWITCHYARD_PENALTY_SECS", "30"),
        ]))
        .unwrap();

        assert_eq!(config.cache.ttl_secs, 120);
        assert_eq!(config.cache.top_k, 3);
        assert_eq!(config.stream.ttl_secs, 5);
        assert_eq!(config.ladder.attempt_timeout_secs, 10);
        assert_eq!(config.ladder.max_retries, 2);
        assert_eq!(config.penalty_secs, 30);
    }

    #[test]
    fn test_malformed_value_names_variable() {
        let err = load_from_lookup(lookup_from(&[("OPENAI_BURST", "lots")])).unwrap_err();
        match err {
            SwitchyardError::Config { key, .. } => assert_eq!(key.as_deref(), Some("OPENAI_BURST")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_rate_rejected() {
        assert!(load_from_lookup(lookup_from(&[("GOOGLE_RPS", "-1")])).is_err());
    }

    #[test]
    fn test_overflowing_penalty_rejected() {
        let result = load_from_lookup(lookup_from(&[(
            "SWITCHYARD_PENALTY_SECS",
            "18446744073709551615",
        )]));
        assert!(result.is_err());
    }
}
