//! Provider adapter contract, dispatch and the normalized result shape

pub mod dispatch;
pub mod messages;
pub mod provider;
pub mod result;

pub use dispatch::{AdapterRegistry, Dispatcher};
pub use messages::{ChatMessage, MessageRole};
pub use provider::{Completion, DispatchStream, EventStream, Invocation, ProviderAdapter, StreamEvent};
pub use result::{ChunkStream, FallbackResult, Usage};
