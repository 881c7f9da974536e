//! In-flight request de-duplication
//!
//! Concurrent requests that map to the same key share one upstream call: the
//! first subscriber owns the session and publishes, everyone else just reads
//! their own bounded queue.

mod hub;
mod session;

#[cfg(test)]
mod tests;

pub use hub::{StreamHub, Subscription};
pub use session::{Finisher, HubEvent};
