//! Error types for the caching proxy
//!
//! Cache-internal failures (`StoreError`, `CodecError`) are always recovered
//! locally by the orchestrator. Only `ProxyError` ever reaches a client, and
//! then only as an opaque 500.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

// == Store Error ==
/// Failure of a filesystem operation on the cache root.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

// == Codec Error ==
/// Failure to turn a cache record into bytes or back.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Record could not be serialized
    #[error("failed to encode cache record: {0}")]
    Encode(#[source] serde_json::Error),

    /// Bytes are not a well-formed record (bad JSON, truncated, missing field, wrong tag)
    #[error("malformed cache record: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Stored status is not a valid HTTP status code
    #[error("invalid status code in cache record: {0}")]
    InvalidStatus(u16),

    /// Stored headers are not a JSON object of string values
    #[error("invalid headers in cache record: {0}")]
    InvalidHeaders(String),
}

// == Proxy Error ==
/// Error surfaced by the fetch path to the request router.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Upstream request failed at the transport level
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        error!(error = %self, "Proxy error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error fetching the URL.",
        )
            .into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the fetch path.
pub type Result<T> = std::result::Result<T, ProxyError>;
