//! Error types for Switchyard
//!
//! Provider failures, timeouts and invalid candidates are ordinary data that the
//! fallback ladder branches on; only configuration and programming mistakes are
//! expected to escape to callers as `Err`.

mod classifiers;
mod constructors;
mod conversions;
mod types;

pub use types::{SwitchyardError, SwitchyardResult};
