//! Cache Module
//!
//! Dataset and query result caching on top of a [`KvStore`](crate::store::KvStore).

mod chunking;
mod dataset;
mod facade;
pub mod keys;
mod metrics;
mod query;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use chunking::{chunk_size_for, compute_chunk_size};
pub use dataset::DatasetCache;
pub use facade::{CacheFacade, CacheSettings};
pub use metrics::{CacheMetrics, MetricsCounter};
pub use query::QueryCache;
