//! Key naming scheme inside the store.
//!
//! These names are shared with every other process using the same store and
//! must not change.

use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::store::current_timestamp_ms;

/// Hash field holding a serialized query result.
pub const RESULTS_FIELD: &str = "results";

/// Counter key for query cache hits.
pub const HITS_KEY: &str = "cache:hits";

/// Counter key for query cache misses.
pub const MISSES_KEY: &str = "cache:misses";

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Entry key for a dataset: `<name>_data`.
pub fn dataset_key(name: &str) -> String {
    format!("{}_data", name)
}

/// Field name of a chunk inside a dataset entry.
pub fn chunk_field(index: usize) -> String {
    index.to_string()
}

/// Entry key for a query result: `<name>:<query_type>:<query_value>`.
pub fn query_key(name: &str, query_type: &str, query_value: &str) -> String {
    format!("{}:{}:{}", name, query_type, query_value)
}

/// A fresh staging key for one populate attempt of `name`.
///
/// Unique per process and call, so concurrent attempts never share a key.
pub fn staging_key(name: &str) -> String {
    format!(
        "{}:staging:{}-{}-{}",
        dataset_key(name),
        process::id(),
        current_timestamp_ms(),
        STAGING_SEQ.fetch_add(1, Ordering::Relaxed)
    )
}
