//! Cache Statistics Module
//!
//! Tracks hits, misses, invalidations, upstream fetches and write failures.
//! Counters are atomic because requests are handled concurrently.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Live counters shared by every request.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
    upstream_fetches: AtomicU64,
    write_failures: AtomicU64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a stored record discarded as corrupt, expired or unreadable.
    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_upstream_fetch(&self) {
        self.upstream_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        StatsSnapshot {
            hits,
            misses,
            invalidations: self.invalidations.load(Ordering::Relaxed),
            upstream_fetches: self.upstream_fetches.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            hit_rate,
            taken_at: Utc::now(),
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub upstream_fetches: u64,
    pub write_failures: u64,
    /// hits / (hits + misses), or 0.0 before any request
    pub hit_rate: f64,
    pub taken_at: DateTime<Utc>,
}
