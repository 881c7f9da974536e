//! Configuration for Switchyard
//!
//! One `SwitchyardConfig` is built at startup (from the environment, a TOML
//! file, or code) and handed to [`crate::Orchestrator::new`].

mod env_loader;
mod file_loader;
mod settings;

pub use env_loader::{load_from_env, load_from_lookup};
pub use file_loader::{load_from_file, load_from_str};
pub use settings::{
    CacheSettings, DEFAULT_PROVIDERS, LadderSettings, MAX_BACKOFF_BASE_MS, MAX_WINDOW_SECS,
    ProviderSettings, StreamSettings, SwitchyardConfig,
};
