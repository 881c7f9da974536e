//! TOML file configuration loading

use super::settings::SwitchyardConfig;
use crate::error::SwitchyardResult;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_from_file<P: AsRef<Path>>(path: P) -> SwitchyardResult<SwitchyardConfig> {
    let content = std::fs::read_to_string(path.as_ref())?;
    load_from_str(&content)
}

/// Parse configuration from TOML text
pub fn load_from_str(content: &str) -> SwitchyardResult<SwitchyardConfig> {
    let mut config: SwitchyardConfig = toml::from_str(content)?;
    config.providers = config
        .providers
        .into_iter()
        .map(|(name, settings)| (name.to_lowercase(), settings))
        .collect();
    config.validate()?;
    Ok(config)
}
