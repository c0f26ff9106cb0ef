//! Proxy Module
//!
//! The fetch path: cache lookup, upstream fallback and the response handed
//! to the router.

mod fetch;
mod response;
mod upstream;

pub use fetch::{FetchCache, InvalidReason, Lookup};
pub use response::{CacheStatus, ProxyResponse};
pub use upstream::{collapse_headers, UpstreamClient, UpstreamResponse};
