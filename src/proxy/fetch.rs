//! Fetch Cache
//!
//! Coordinates cache lookup with upstream fetch: serve a fresh stored
//! record if there is one, otherwise fetch, persist and return.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::record::{current_timestamp_ms, decode, encode};
use crate::cache::{CacheKey, CacheRecord, CacheStats, DiskStore, DEFAULT_CONTENT_TYPE};
use crate::error::{CodecError, Result, StoreError};
use crate::proxy::response::{CacheStatus, ProxyResponse};
use crate::proxy::upstream::UpstreamClient;

// == Lookup ==
/// Outcome of reading a key from the store.
#[derive(Debug)]
pub enum Lookup {
    /// Fresh, well-formed record
    Hit(CacheRecord),
    /// Nothing stored
    Miss,
    /// Something is stored but must not be served
    Invalid(InvalidReason),
}

/// Why a stored entry was rejected.
#[derive(Error, Debug)]
pub enum InvalidReason {
    #[error("record is corrupt: {0}")]
    Corrupt(#[from] CodecError),

    #[error("record expired {age_ms} ms after creation")]
    Expired { age_ms: i64 },

    #[error("record could not be read: {0}")]
    Unreadable(#[from] StoreError),
}

// == Fetch Cache ==
/// Cache-aside fetcher over a [`DiskStore`] and an [`UpstreamClient`].
#[derive(Debug)]
pub struct FetchCache {
    store: DiskStore,
    upstream: UpstreamClient,
    ttl: Duration,
    stats: CacheStats,
}

impl FetchCache {
    pub fn new(store: DiskStore, upstream: UpstreamClient, ttl: Duration) -> Self {
        Self {
            store,
            upstream,
            ttl,
            stats: CacheStats::new(),
        }
    }

    pub fn store(&self) -> &DiskStore {
        &self.store
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Lookup ==
    /// Reads and validates the record stored under `key`.
    ///
    /// Decoding is checked before age, so an unreadable record is invalid
    /// regardless of how old it claims to be. Nothing is deleted here.
    pub async fn lookup(&self, key: &CacheKey) -> Lookup {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Lookup::Miss,
            Err(e) => return Lookup::Invalid(e.into()),
        };

        let record = match decode(&bytes) {
            Ok(record) => record,
            Err(e) => return Lookup::Invalid(e.into()),
        };

        let now = current_timestamp_ms();
        if record.is_expired_at(now, self.ttl) {
            return Lookup::Invalid(InvalidReason::Expired {
                age_ms: record.age_ms(now),
            });
        }
        Lookup::Hit(record)
    }

    /// Best-effort removal of a rejected entry. Failures are logged only.
    ///
    /// The entry is not re-checked before deletion, so a fresh record written
    /// by a concurrent request after the lookup can be removed as well. The
    /// next request for that URL is then a miss and refetches.
    async fn discard(&self, key: &CacheKey, reason: &InvalidReason) {
        self.stats.record_invalidation();
        warn!(key = %key, %reason, "Discarding cache entry");
        if let Err(e) = self.store.delete(key).await {
            warn!(key = %key, error = %e, "Error deleting cache entry");
        }
    }

    // == Fetch With Cache ==
    /// Produces the response for `url`, from cache when fresh.
    ///
    /// Only an upstream transport failure is returned as an error; every
    /// cache-side failure degrades to a miss or is logged and ignored.
    pub async fn fetch_with_cache(&self, url: &str) -> Result<ProxyResponse> {
        let key = CacheKey::for_url(url);

        match self.lookup(&key).await {
            Lookup::Hit(record) => {
                self.stats.record_hit();
                debug!(url, key = %key, "Cache hit");
                return Ok(ProxyResponse::from_record(record, CacheStatus::Hit));
            }
            Lookup::Miss => debug!(url, key = %key, "Cache miss"),
            Lookup::Invalid(reason) => self.discard(&key, &reason).await,
        }
        self.stats.record_miss();

        self.stats.record_upstream_fetch();
        let fetched = self.upstream.fetch(url).await?;

        let record = CacheRecord {
            url: url.to_string(),
            status: fetched.status,
            headers: fetched.headers,
            body: fetched.body,
            content_type: fetched
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            created_at: current_timestamp_ms(),
        };

        self.persist(&key, &record).await;
        Ok(ProxyResponse::from_record(record, CacheStatus::Miss))
    }

    /// Writes `record` under `key`. A failure is logged, never propagated.
    async fn persist(&self, key: &CacheKey, record: &CacheRecord) {
        let bytes = match encode(record) {
            Ok(bytes) => bytes,
            Err(error) => {
                self.stats.record_write_failure();
                warn!(key = %key, %error, "Failed to encode cache entry");
                return;
            }
        };
        if let Err(error) = self.store.put(key, &bytes).await {
            self.stats.record_write_failure();
            warn!(key = %key, %error, "Failed to write cache entry");
        }
    }

    // == Sweep ==
    /// Deletes every stored record that is expired or corrupt.
    ///
    /// Returns the number of entries removed.
    pub async fn sweep(&self) -> std::result::Result<usize, StoreError> {
        let mut removed = 0;
        for key in self.store.keys().await? {
            if let Lookup::Invalid(reason) = self.lookup(&key).await {
                self.discard(&key, &reason).await;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
