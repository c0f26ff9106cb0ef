//! Proxy Response
//!
//! The response the fetch path hands back to the router, and its
//! conversion into an axum response.

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::cache::CacheRecord;

/// Headers that describe the upstream connection or framing, not the payload.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "content-length",
];

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

// == Proxy Response ==
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Resolved content type, never empty
    pub content_type: String,
    pub body: String,
    pub cache_status: CacheStatus,
}

impl ProxyResponse {
    pub fn from_record(record: CacheRecord, cache_status: CacheStatus) -> Self {
        let content_type = record.resolved_content_type().to_string();
        Self {
            status: record.status,
            headers: record.headers,
            content_type,
            body: record.body,
            cache_status,
        }
    }
}

fn is_replayable(name: &str) -> bool {
    !name.eq_ignore_ascii_case(CONTENT_TYPE.as_str())
        && !HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);

        let mut headers = HeaderMap::new();
        for (name, value) in self.headers.iter().filter(|(n, _)| is_replayable(n)) {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => debug!(header = %name, "Skipping header that is not valid HTTP"),
            }
        }

        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(crate::cache::DEFAULT_CONTENT_TYPE));
        headers.insert(CONTENT_TYPE, content_type);

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}
