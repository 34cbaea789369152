//! Query Cache Module
//!
//! Memoizes query results under `<name>:<query_type>:<query_value>`, one hash
//! entry per query with the rows in a single `results` field.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::keys::{query_key, RESULTS_FIELD};
use crate::cache::metrics::MetricsCounter;
use crate::data::{decode_rows, encode_rows, Row};
use crate::error::Result;
use crate::store::KvStore;

// == Query Cache ==
/// Cache-aside storage for query results.
#[derive(Clone)]
pub struct QueryCache {
    store: Arc<dyn KvStore>,
    metrics: MetricsCounter,
    /// TTL in seconds applied to each result entry
    ttl: u64,
}

impl QueryCache {
    pub fn new(store: Arc<dyn KvStore>, metrics: MetricsCounter, ttl: u64) -> Self {
        Self {
            store,
            metrics,
            ttl,
        }
    }

    // == Lookup ==
    /// Returns the cached result, counting a hit or a miss.
    ///
    /// Store and decode failures count as misses and are only logged.
    pub async fn lookup(
        &self,
        name: &str,
        query_type: &str,
        query_value: &str,
    ) -> Option<Vec<Row>> {
        let key = query_key(name, query_type, query_value);
        match self.fetch(&key).await {
            Ok(Some(rows)) => {
                if let Err(err) = self.metrics.increment_hit().await {
                    warn!("Could not record cache hit: {}", err);
                }
                debug!("Cache hit for {}", key);
                Some(rows)
            }
            Ok(None) => {
                self.record_miss().await;
                debug!("Cache miss for {}", key);
                None
            }
            Err(err) => {
                self.record_miss().await;
                warn!("Treating {} as a miss: {}", key, err);
                None
            }
        }
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<Row>>> {
        match self.store.hget(key, RESULTS_FIELD).await? {
            Some(payload) => Ok(Some(decode_rows(&payload)?)),
            None => Ok(None),
        }
    }

    async fn record_miss(&self) {
        if let Err(err) = self.metrics.increment_miss().await {
            warn!("Could not record cache miss: {}", err);
        }
    }

    // == Store ==
    /// Writes a result and sets its TTL. Leaves the counters alone.
    pub async fn store(
        &self,
        name: &str,
        query_type: &str,
        query_value: &str,
        rows: &[Row],
    ) -> Result<()> {
        let key = query_key(name, query_type, query_value);
        let payload = encode_rows(rows)?;
        self.store.hset(&key, RESULTS_FIELD, &payload).await?;
        self.store.expire(&key, self.ttl).await?;
        debug!("Stored {} rows under {}", rows.len(), key);
        Ok(())
    }

    // == Get Or Compute ==
    /// Returns the cached result or runs `compute` and caches what it returns.
    ///
    /// Caching the computed result is best effort: a failed write is logged and
    /// the result is still returned. Only an error from `compute` itself is
    /// returned to the caller.
    pub async fn get_or_compute<F, Fut>(
        &self,
        name: &str,
        query_type: &str,
        query_value: &str,
        compute: F,
    ) -> Result<Vec<Row>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Row>>>,
    {
        if let Some(rows) = self.lookup(name, query_type, query_value).await {
            return Ok(rows);
        }

        info!(
            "Computing {}:{}:{} (not cached)",
            name, query_type, query_value
        );
        let rows = compute().await?;
        if let Err(err) = self.store(name, query_type, query_value, &rows).await {
            warn!(
                "Could not cache {}:{}:{}: {}",
                name, query_type, query_value, err
            );
        }
        Ok(rows)
    }
}
