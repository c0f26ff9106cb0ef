//! Upstream Client
//!
//! Thin wrapper over `reqwest` that performs the GET and buffers the whole
//! response as text.

use std::time::Duration;

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use tracing::debug;

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    /// One entry per header name; repeated headers are joined with ", "
    pub headers: Vec<(String, String)>,
    /// Upstream content type, if it sent a non-empty one
    pub content_type: Option<String>,
    pub body: String,
}

// == Upstream Client ==
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    /// Builds a client, optionally bounding each request by `timeout`.
    pub fn new(timeout: Option<Duration>) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    /// Issues a GET to `url` and reads the body as text.
    ///
    /// Only transport failures are errors; any HTTP status is a valid response.
    pub async fn fetch(&self, url: &str) -> Result<UpstreamResponse, reqwest::Error> {
        let response = self.http.get(url).send().await?;

        let status = response.status().as_u16();
        let headers = collapse_headers(response.headers());
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let body = response.text().await?;

        debug!(url, status, bytes = body.len(), "Fetched upstream");
        Ok(UpstreamResponse {
            status,
            headers,
            content_type,
            body,
        })
    }
}

/// Flattens a header map to one `(name, value)` pair per name.
///
/// Values that are not visible ASCII could not be replayed, so they are
/// dropped here. A name left with no values is omitted.
pub fn collapse_headers(map: &HeaderMap) -> Vec<(String, String)> {
    map.keys()
        .filter_map(|name| {
            let values: Vec<&str> = map
                .get_all(name)
                .iter()
                .filter_map(|value| match value.to_str() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        debug!(header = %name, "Skipping non-ASCII upstream header value");
                        None
                    }
                })
                .collect();
            if values.is_empty() {
                return None;
            }
            Some((name.as_str().to_string(), values.join(", ")))
        })
        .collect()
}
