//! Store Module
//!
//! The key-value store protocol the cache is written against, plus a Redis
//! implementation and an in-process implementation with the same semantics.

mod entry;
mod memory;
mod redis_store;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

pub use entry::{current_timestamp_ms, EntryValue, StoredEntry};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

// == Key-Value Store ==
/// Commands the cache needs from its backing store.
///
/// Expiry always applies to a whole key, never to single hash fields.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Connectivity check.
    async fn ping(&self) -> Result<()>;

    /// Whether `key` currently exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Deletes `key`, returning the number of keys removed (0 or 1).
    async fn del(&self, key: &str) -> Result<u64>;

    /// Sets one field of the hash at `key`, creating the hash if needed.
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()>;

    /// All fields of the hash at `key`; empty when the key is absent.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Number of fields in the hash at `key`; 0 when the key is absent.
    async fn hlen(&self, key: &str) -> Result<u64>;

    /// One field of the hash at `key`.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>>;

    /// Sets the whole-key expiry. Returns false when the key does not exist.
    async fn expire(&self, key: &str, seconds: u64) -> Result<bool>;

    /// Atomically increments the integer at `key`, returning the new value.
    async fn incr(&self, key: &str) -> Result<u64>;

    /// Reads a string key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Atomically renames `from` to `to`, replacing any existing `to`.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;
}
