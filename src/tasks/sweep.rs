//! Cache Sweep Task
//!
//! Background task that periodically removes expired and corrupt records
//! from disk. Expiry is still enforced on every read; the sweep only keeps
//! records for URLs nobody asks for again from piling up.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::proxy::FetchCache;

/// Spawns a background task that periodically sweeps the cache directory.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between runs.
///
/// # Arguments
/// * `cache` - Shared fetcher whose store is swept
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let sweep_handle = spawn_sweep_task(state.cache.clone(), 300);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(cache: Arc<FetchCache>, sweep_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting cache sweep task with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            match cache.sweep().await {
                Ok(0) => debug!("Cache sweep: no invalid entries found"),
                Ok(removed) => info!("Cache sweep: removed {} invalid entries", removed),
                Err(e) => warn!(error = %e, "Cache sweep failed"),
            }

            let stats = cache.stats().snapshot();
            debug!(
                hits = stats.hits,
                misses = stats.misses,
                invalidations = stats.invalidations,
                upstream_fetches = stats.upstream_fetches,
                write_failures = stats.write_failures,
                hit_rate = stats.hit_rate,
                "Cache statistics"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::record::{current_timestamp_ms, encode};
    use crate::cache::{CacheKey, CacheRecord, DiskStore};
    use crate::proxy::UpstreamClient;

    async fn test_cache() -> (tempfile::TempDir, Arc<FetchCache>) {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path()).await.unwrap();
        let upstream = UpstreamClient::new(None).unwrap();
        let cache = FetchCache::new(store, upstream, Duration::from_secs(3600));
        (dir, Arc::new(cache))
    }

    async fn put_record(cache: &FetchCache, url: &str, created_at: i64) -> CacheKey {
        let key = CacheKey::for_url(url);
        let record = CacheRecord {
            url: url.to_string(),
            status: 200,
            headers: Vec::new(),
            body: "[]".to_string(),
            content_type: "application/json".to_string(),
            created_at,
        };
        cache
            .store()
            .put(&key, &encode(&record).unwrap())
            .await
            .unwrap();
        key
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let (_dir, cache) = test_cache().await;
        let two_hours_ago = current_timestamp_ms() - 7_200_000;
        let key = put_record(&cache, "http://upstream.test/old", two_hours_ago).await;

        let handle = spawn_sweep_task(cache.clone(), 1);

        // Wait for the sweep to run
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(
            cache.store().get(&key).await.unwrap().is_none(),
            "Expired entry should have been swept"
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let (_dir, cache) = test_cache().await;
        let key = put_record(&cache, "http://upstream.test/new", current_timestamp_ms()).await;

        let handle = spawn_sweep_task(cache.clone(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(
            cache.store().get(&key).await.unwrap().is_some(),
            "Valid entry should not be removed"
        );

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let (_dir, cache) = test_cache().await;

        let handle = spawn_sweep_task(cache, 1);

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
