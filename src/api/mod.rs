//! API Module
//!
//! HTTP surface of the proxy.
//!
//! # Endpoints
//! - `GET <any-path>` - Proxied to `<upstream><path>` through the cache
//! - `OPTIONS <any-path>` - CORS preflight, empty body
//! - Any other method - `405 Method not allowed`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, CORS_HEADERS};
