//! TTL-bounded response cache
//!
//! Completed, cacheable results are stored under a fingerprint of the
//! normalized request. Expired entries are evicted lazily on read and in bulk
//! when the store reaches its size cap.

mod fingerprint;
mod response_cache;
mod types;

pub use fingerprint::{normalize_text, prompt_fingerprint, request_fingerprint};
pub use response_cache::ResponseCache;
pub use types::{CacheEntry, CacheStatistics};
