//! Switchyard Core Library
//!
//! The orchestration layer that sits between application logic and a set of
//! interchangeable text-generation providers:
//!
//! - [`fallback`]: intent → ordered provider/model ladder, retried with jittered backoff
//! - [`pacer`]: per-provider token bucket + concurrency gate with AIMD penalties
//! - [`stream_hub`]: shares one upstream call between identical in-flight requests
//! - [`cache`]: TTL-bounded store of completed responses
//! - [`llm`]: adapter contract, dispatcher and the normalized result shape
//! - [`orchestrator`]: the context object that wires all of the above together

pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod llm;
pub mod orchestrator;
pub mod pacer;
pub mod stream_hub;

// Re-export commonly used types
pub use cache::{CacheStatistics, ResponseCache};
pub use config::SwitchyardConfig;
pub use error::{SwitchyardError, SwitchyardResult};
pub use fallback::{Intent, Ladder, LadderEntry, LadderOptions, call_with_fallback, jittered_backoff};
pub use llm::{
    AdapterRegistry, ChatMessage, Completion, Dispatcher, FallbackResult, Invocation, MessageRole,
    ProviderAdapter, StreamEvent, Usage,
};
pub use orchestrator::{DispatchRequest, Orchestrator};
pub use pacer::{PacerPermit, PacerRegistry, ProviderPacer};
pub use stream_hub::{Finisher, HubEvent, StreamHub, Subscription};
