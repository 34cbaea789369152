//! Dataset Cache - caches tabular datasets and query results in a TTL-bounded
//! key-value store
//!
//! Datasets are split into row chunks stored as fields of one hash per
//! dataset; aggregation results are stored per (dataset, query, value) with
//! hit/miss counters kept alongside.

pub mod analytics;
pub mod api;
pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheFacade, CacheSettings};
pub use config::{Config, StoreBackend};
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
