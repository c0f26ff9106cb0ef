//! Cache Module
//!
//! On-disk response cache: key derivation, record codec, durable storage
//! and counters.

mod key;
pub mod record;
mod stats;
mod store;


// Re-export public types
pub use key::CacheKey;
pub use record::{CacheRecord, DEFAULT_CONTENT_TYPE};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::DiskStore;
