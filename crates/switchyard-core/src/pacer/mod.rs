//! Adaptive per-provider rate pacing
//!
//! Each provider key gets a token bucket (burst smoothing) whose refill rate is
//! driven by an AIMD state: rate-limit signals cut the rate multiplicatively,
//! and it recovers additively once the penalty window has passed. A separate
//! semaphore bounds simultaneously in-flight calls.

mod adaptive;
mod bucket;
mod limiter;
mod registry;


pub use adaptive::{AdaptiveRate, PENALTY_FACTOR, RATE_FLOOR, RECOVERY_PER_SEC};
pub use bucket::TokenBucket;
pub use limiter::{PacerPermit, PacerSnapshot, PacerStats, ProviderPacer};
pub use registry::PacerRegistry;
