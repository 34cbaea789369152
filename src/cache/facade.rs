//! Cache Facade Module
//!
//! The two operations callers use: load a dataset (from cache or source) and
//! get a query result (from cache or by computing it).

use std::future::Future;
use std::sync::Arc;

use tracing::info;

use crate::cache::dataset::DatasetCache;
use crate::cache::metrics::{CacheMetrics, MetricsCounter};
use crate::cache::query::QueryCache;
use crate::config::Config;
use crate::data::{Row, SourceReader};
use crate::error::{CacheError, Result};
use crate::store::KvStore;

// == Cache Settings ==
/// Tuning shared by dataset and query entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// TTL in seconds for every entry written
    pub ttl: u64,
    /// Number of chunks a dataset is split into
    pub target_chunks: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: 300,
            target_chunks: 100,
        }
    }
}

impl From<&Config> for CacheSettings {
    fn from(config: &Config) -> Self {
        Self {
            ttl: config.cache_ttl,
            target_chunks: config.default_chunks,
        }
    }
}

// == Cache Facade ==
pub struct CacheFacade {
    datasets: DatasetCache,
    queries: QueryCache,
    metrics: MetricsCounter,
    settings: CacheSettings,
}

impl CacheFacade {
    // == Constructor ==
    /// Builds the facade after checking the store answers.
    ///
    /// An unreachable store is reported as [`CacheError::Connection`]; no
    /// cache operation can work without it.
    pub async fn connect(
        store: Arc<dyn KvStore>,
        source: Arc<dyn SourceReader>,
        settings: CacheSettings,
    ) -> Result<Self> {
        store.ping().await.map_err(|err| match err {
            CacheError::Connection(_) => err,
            other => CacheError::Connection(other.to_string()),
        })?;

        let metrics = MetricsCounter::new(store.clone());
        info!(
            "Cache ready (ttl={}s, target_chunks={})",
            settings.ttl, settings.target_chunks
        );
        Ok(Self {
            datasets: DatasetCache::new(
                store.clone(),
                source,
                settings.ttl,
                settings.target_chunks,
            ),
            queries: QueryCache::new(store, metrics.clone(), settings.ttl),
            metrics,
            settings,
        })
    }

    /// Dataset `name`, loaded from the cache or populated from the source.
    pub async fn dataset(&self, name: &str) -> Result<Vec<Row>> {
        self.datasets.load_or_populate(name).await
    }

    /// Result of a query, from the cache or computed by `compute`.
    pub async fn query_result<F, Fut>(
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
        self.queries
            .get_or_compute(name, query_type, query_value, compute)
            .await
    }

    /// Drops the cached copy of dataset `name`. Returns 1 if one existed.
    pub async fn clear_dataset(&self, name: &str) -> Result<u64> {
        self.datasets.clear(name).await
    }

    /// Current hit/miss totals.
    pub async fn cache_metrics(&self) -> Result<CacheMetrics> {
        self.metrics.snapshot().await
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CsvSource, DatasetCatalog};
    use crate::store::MemoryStore;
    use std::collections::HashMap;

    /// Store whose every command fails, like an unreachable Redis.
    struct UnreachableStore;

    fn refused<T>() -> Result<T> {
        Err(CacheError::Store("Connection refused (os error 111)".to_string()))
    }

    #[async_trait::async_trait]
    impl KvStore for UnreachableStore {
        async fn ping(&self) -> Result<()> {
            refused()
        }
        async fn exists(&self, _key: &str) -> Result<bool> {
            refused()
        }
        async fn del(&self, _key: &str) -> Result<u64> {
            refused()
        }
        async fn hset(&self, _key: &str, _field: &str, _value: &str) -> Result<()> {
            refused()
        }
        async fn hgetall(&self, _key: &str) -> Result<HashMap<String, String>> {
            refused()
        }
        async fn hlen(&self, _key: &str) -> Result<u64> {
            refused()
        }
        async fn hget(&self, _key: &str, _field: &str) -> Result<Option<String>> {
            refused()
        }
        async fn expire(&self, _key: &str, _seconds: u64) -> Result<bool> {
            refused()
        }
        async fn incr(&self, _key: &str) -> Result<u64> {
            refused()
        }
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            refused()
        }
        async fn rename(&self, _from: &str, _to: &str) -> Result<()> {
            refused()
        }
    }

    #[tokio::test]
    async fn test_connect_with_reachable_store() {
        let facade = CacheFacade::connect(
            Arc::new(MemoryStore::new()),
            Arc::new(CsvSource::new("data", DatasetCatalog::default())),
            CacheSettings::default(),
        )
        .await
        .unwrap();

        assert_eq!(facade.settings().ttl, 300);
        assert_eq!(facade.cache_metrics().await.unwrap(), CacheMetrics::default());
    }

    #[tokio::test]
    async fn test_connect_with_unreachable_store_is_connection_error() {
        let result = CacheFacade::connect(
            Arc::new(UnreachableStore),
            Arc::new(CsvSource::new("data", DatasetCatalog::default())),
            CacheSettings::default(),
        )
        .await;

        match result {
            Err(CacheError::Connection(message)) => assert!(message.contains("refused")),
            Err(other) => panic!("expected a connection error, got {}", other),
            Ok(_) => panic!("connect succeeded against an unreachable store"),
        }
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            cache_ttl: 60,
            default_chunks: 8,
            ..Config::default()
        };
        let settings = CacheSettings::from(&config);
        assert_eq!(settings.ttl, 60);
        assert_eq!(settings.target_chunks, 8);
    }
}
