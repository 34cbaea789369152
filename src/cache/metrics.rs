//! Cache Metrics Module
//!
//! Hit and miss counters for query lookups, kept in the store so every process
//! sharing the store accumulates into the same totals.

use std::sync::Arc;

use serde::Serialize;

use crate::cache::keys::{HITS_KEY, MISSES_KEY};
use crate::error::{CacheError, Result};
use crate::store::KvStore;

// == Cache Metrics ==
/// Snapshot of the query cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    /// Number of lookups answered from the cache
    pub hits: u64,
    /// Number of lookups that had to be computed
    pub misses: u64,
}

impl CacheMetrics {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Metrics Counter ==
/// Store-backed hit/miss counters. There is no reset; the counters live as
/// long as the store keeps them.
#[derive(Clone)]
pub struct MetricsCounter {
    store: Arc<dyn KvStore>,
}

impl MetricsCounter {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    // == Record Hit ==
    /// Increments the hit counter, returning the new total.
    pub async fn increment_hit(&self) -> Result<u64> {
        self.store.incr(HITS_KEY).await
    }

    // == Record Miss ==
    /// Increments the miss counter, returning the new total.
    pub async fn increment_miss(&self) -> Result<u64> {
        self.store.incr(MISSES_KEY).await
    }

    // == Snapshot ==
    /// Reads both counters. Counters never written read as 0.
    pub async fn snapshot(&self) -> Result<CacheMetrics> {
        Ok(CacheMetrics {
            hits: self.read(HITS_KEY).await?,
            misses: self.read(MISSES_KEY).await?,
        })
    }

    async fn read(&self, key: &str) -> Result<u64> {
        match self.store.get(key).await? {
            Some(raw) => raw.parse().map_err(|_| {
                CacheError::CorruptEntry(format!("counter {} holds '{}'", key, raw))
            }),
            None => Ok(0),
        }
    }
}
