//! The constructed-once context object
//!
//! [`Orchestrator`] owns the pacer registry, stream hub, response cache,
//! dispatcher and ladder, and performs the checks the ladder leaves to its
//! caller: request-level cache lookup, in-flight de-duplication, prompt-level
//! cache lookup per candidate, and pacer penalties on rate-limit signals.

mod context;
mod request;

pub use context::Orchestrator;
pub use request::{CachedResponse, DispatchRequest, RelayEvent};
