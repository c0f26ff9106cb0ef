//! Cache Proxy - A transparent HTTP forwarding proxy with an on-disk cache
//!
//! Rewrites every inbound path onto a fixed upstream base URL, serves fresh
//! cached responses from disk, and applies a permissive CORS header set to
//! every response.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod proxy;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use tasks::spawn_sweep_task;
