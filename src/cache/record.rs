//! Cache Record Module
//!
//! The persisted unit of cached state for one upstream URL, plus its
//! on-disk codec and freshness rules.

use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CodecError;

/// Content type applied when upstream sends none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

// == Cache Record ==
/// A captured upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    /// Fully resolved upstream URL that produced this record
    pub url: String,
    /// Upstream HTTP status code
    pub status: u16,
    /// Upstream headers in capture order. Names must be unique; `encode`
    /// rejects a record that repeats one.
    pub headers: Vec<(String, String)>,
    /// Response body decoded as text
    pub body: String,
    /// Effective content type
    pub content_type: String,
    /// Creation timestamp (Unix milliseconds), set once at write time
    pub created_at: i64,
}

impl CacheRecord {
    // == Age ==
    /// Milliseconds elapsed between creation and `now_ms`.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.created_at)
    }

    // == Is Expired ==
    /// Checks whether the record has outlived `ttl` at `now_ms`.
    ///
    /// A record whose age equals the TTL exactly is still fresh; one
    /// millisecond later it is expired.
    pub fn is_expired_at(&self, now_ms: i64, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.age_ms(now_ms) > ttl_ms
    }

    /// Content type to serve, falling back to [`DEFAULT_CONTENT_TYPE`].
    pub fn resolved_content_type(&self) -> &str {
        if self.content_type.is_empty() {
            DEFAULT_CONTENT_TYPE
        } else {
            &self.content_type
        }
    }
}

// == On-disk Layout ==
#[derive(Debug, Serialize, Deserialize)]
enum RecordKind {
    #[serde(rename = "cache")]
    Cache,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRecord {
    #[serde(rename = "type")]
    kind: RecordKind,
    url: String,
    status: u16,
    /// JSON-encoded object of header name to value
    headers: String,
    text: String,
    content_type: String,
    created: i64,
}

/// Status codes a stored record may carry.
const VALID_STATUS: RangeInclusive<u16> = 100..=599;

// == Encode ==
/// Serializes a record into its on-disk JSON form.
///
/// Refuses anything `decode` would reject, so a stored record always reads
/// back as the record that was written.
pub fn encode(record: &CacheRecord) -> Result<Vec<u8>, CodecError> {
    if !VALID_STATUS.contains(&record.status) {
        return Err(CodecError::InvalidStatus(record.status));
    }

    let mut headers = Map::with_capacity(record.headers.len());
    for (name, value) in &record.headers {
        if headers
            .insert(name.clone(), Value::String(value.clone()))
            .is_some()
        {
            return Err(CodecError::InvalidHeaders(format!(
                "duplicate header '{}'",
                name
            )));
        }
    }
    let headers = serde_json::to_string(&headers).map_err(CodecError::Encode)?;

    let stored = StoredRecord {
        kind: RecordKind::Cache,
        url: record.url.clone(),
        status: record.status,
        headers,
        text: record.body.clone(),
        content_type: record.content_type.clone(),
        created: record.created_at,
    };
    serde_json::to_vec(&stored).map_err(CodecError::Encode)
}

// == Decode ==
/// Parses an on-disk record, failing on anything malformed or incomplete.
pub fn decode(bytes: &[u8]) -> Result<CacheRecord, CodecError> {
    let stored: StoredRecord = serde_json::from_slice(bytes).map_err(CodecError::Malformed)?;

    if !VALID_STATUS.contains(&stored.status) {
        return Err(CodecError::InvalidStatus(stored.status));
    }

    let raw: Map<String, Value> = serde_json::from_str(&stored.headers)
        .map_err(|e| CodecError::InvalidHeaders(e.to_string()))?;
    let headers = raw
        .into_iter()
        .map(|(name, value)| match value {
            Value::String(value) => Ok((name, value)),
            other => Err(CodecError::InvalidHeaders(format!(
                "header '{}' has non-string value {}",
                name, other
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CacheRecord {
        url: stored.url,
        status: stored.status,
        headers,
        body: stored.text,
        content_type: stored.content_type,
        created_at: stored.created,
    })
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
