//! Intent-driven provider fallback
//!
//! An intent label selects an ordered chain of provider/model candidates.
//! [`call_with_fallback`] walks that chain strictly in order, retrying each
//! candidate with jittered exponential backoff before advancing, and turns
//! total exhaustion into a normal [`FallbackResult`](crate::llm::FallbackResult)
//! with `error` set.

mod backoff;
mod catalog;
mod intent;
mod ladder;
mod runner;


pub use backoff::{JITTER_RATIO, jittered_backoff};
pub use catalog::ModelCatalog;
pub use intent::Intent;
pub use ladder::{Ladder, LadderBuilder, LadderEntry};
pub use runner::{LadderOptions, call_with_fallback};
