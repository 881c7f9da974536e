//! Subcommand implementations

pub mod chain;
pub mod config;
pub mod simulate;
