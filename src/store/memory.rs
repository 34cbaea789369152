//! In-Process Store Module
//!
//! HashMap-backed store following Redis semantics for the commands the cache
//! uses: whole-key expiry, lazy expiry on access, type checks per key.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{CacheError, Result};
use crate::store::{EntryValue, KvStore, StoredEntry};

// == Memory Store ==
/// In-process key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Key-value storage
    entries: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of live (unexpired) keys.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|entry| !entry.is_expired()).count()
    }

    // == Is Empty ==
    /// Returns true if no live key exists.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Live keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Remaining TTL of `key` in seconds; None when absent or without expiry.
    pub async fn ttl(&self, key: &str) -> Option<u64> {
        let entries = self.entries.read().await;
        visible(entries.get(key)).and_then(StoredEntry::ttl_remaining)
    }
}

fn visible(entry: Option<&StoredEntry>) -> Option<&StoredEntry> {
    entry.filter(|entry| !entry.is_expired())
}

/// Drops `key` if it has expired, so writes never revive stale data.
fn purge_expired(entries: &mut HashMap<String, StoredEntry>, key: &str) {
    if entries.get(key).is_some_and(StoredEntry::is_expired) {
        entries.remove(key);
    }
}

fn wrong_type() -> CacheError {
    CacheError::Store(
        "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
    )
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(visible(entries.get(key)).is_some())
    }

    async fn del(&self, key: &str) -> Result<u64> {
        let mut entries = self.entries.write().await;
        purge_expired(&mut entries, key);
        Ok(entries.remove(key).map_or(0, |_| 1))
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        purge_expired(&mut entries, key);
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(StoredEntry::hash);
        match &mut entry.value {
            EntryValue::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
                Ok(())
            }
            EntryValue::String(_) => Err(wrong_type()),
        }
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let entries = self.entries.read().await;
        match visible(entries.get(key)).map(|entry| &entry.value) {
            Some(EntryValue::Hash(fields)) => Ok(fields.clone()),
            Some(EntryValue::String(_)) => Err(wrong_type()),
            None => Ok(HashMap::new()),
        }
    }

    async fn hlen(&self, key: &str) -> Result<u64> {
        let entries = self.entries.read().await;
        match visible(entries.get(key)).map(|entry| &entry.value) {
            Some(EntryValue::Hash(fields)) => Ok(fields.len() as u64),
            Some(EntryValue::String(_)) => Err(wrong_type()),
            None => Ok(0),
        }
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        match visible(entries.get(key)).map(|entry| &entry.value) {
            Some(EntryValue::Hash(fields)) => Ok(fields.get(field).cloned()),
            Some(EntryValue::String(_)) => Err(wrong_type()),
            None => Ok(None),
        }
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<bool> {
        let mut entries = self.entries.write().await;
        purge_expired(&mut entries, key);
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expire_in(seconds);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn incr(&self, key: &str) -> Result<u64> {
        let mut entries = self.entries.write().await;
        purge_expired(&mut entries, key);
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| StoredEntry::new(EntryValue::String("0".to_string())));
        match &mut entry.value {
            EntryValue::String(raw) => {
                let current: u64 = raw.parse().map_err(|_| {
                    CacheError::Store("ERR value is not an integer or out of range".to_string())
                })?;
                let next = current + 1;
                *raw = next.to_string();
                Ok(next)
            }
            EntryValue::Hash(_) => Err(wrong_type()),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        match visible(entries.get(key)).map(|entry| &entry.value) {
            Some(EntryValue::String(raw)) => Ok(Some(raw.clone())),
            Some(EntryValue::Hash(_)) => Err(wrong_type()),
            None => Ok(None),
        }
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        purge_expired(&mut entries, from);
        let entry = entries
            .remove(from)
            .ok_or_else(|| CacheError::Store("ERR no such key".to_string()))?;
        entries.insert(to.to_string(), entry);
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_store_new() {
        let store = MemoryStore::new();
        assert_eq!(store.len().await, 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_hset_and_hgetall() {
        let store = MemoryStore::new();

        store.hset("flights_data", "0", "[]").await.unwrap();
        store.hset("flights_data", "1", "[{}]").await.unwrap();

        let fields = store.hgetall("flights_data").await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["1"], "[{}]");
        assert_eq!(
            store.hget("flights_data", "0").await.unwrap(),
            Some("[]".to_string())
        );
        assert_eq!(store.hget("flights_data", "9").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_hgetall_missing_key_is_empty() {
        let store = MemoryStore::new();
        assert!(store.hgetall("nothing").await.unwrap().is_empty());
        assert_eq!(store.hlen("nothing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_hlen_counts_fields() {
        let store = MemoryStore::new();
        store.hset("airports_data", "0", "[]").await.unwrap();
        store.hset("airports_data", "1", "[]").await.unwrap();
        store.hset("airports_data", "1", "[{}]").await.unwrap();

        assert_eq!(store.hlen("airports_data").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_del_reports_count() {
        let store = MemoryStore::new();
        store.hset("k", "f", "v").await.unwrap();

        assert_eq!(store.del("k").await.unwrap(), 1);
        assert_eq!(store.del("k").await.unwrap(), 0);
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_expire_missing_key() {
        let store = MemoryStore::new();
        assert!(!store.expire("ghost", 10).await.unwrap());
    }

    #[tokio::test]
    async fn test_whole_key_expiration() {
        let store = MemoryStore::new();
        store.hset("k", "0", "a").await.unwrap();
        store.hset("k", "1", "b").await.unwrap();
        assert!(store.expire("k", 1).await.unwrap());

        assert_eq!(store.hgetall("k").await.unwrap().len(), 2);

        // Wait for expiration
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(store.hgetall("k").await.unwrap().is_empty());
        assert!(!store.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_hset_keeps_existing_ttl() {
        let store = MemoryStore::new();
        store.hset("k", "0", "a").await.unwrap();
        store.expire("k", 60).await.unwrap();
        store.hset("k", "1", "b").await.unwrap();

        assert!(store.ttl("k").await.is_some());
    }

    #[tokio::test]
    async fn test_incr_counts_from_zero() {
        let store = MemoryStore::new();

        assert_eq!(store.get("cache:hits").await.unwrap(), None);
        assert_eq!(store.incr("cache:hits").await.unwrap(), 1);
        assert_eq!(store.incr("cache:hits").await.unwrap(), 2);
        assert_eq!(
            store.get("cache:hits").await.unwrap(),
            Some("2".to_string())
        );
    }

    #[tokio::test]
    async fn test_wrong_type_errors() {
        let store = MemoryStore::new();
        store.hset("h", "f", "v").await.unwrap();
        store.incr("n").await.unwrap();

        assert!(store.incr("h").await.is_err());
        assert!(store.get("h").await.is_err());
        assert!(store.hset("n", "f", "v").await.is_err());
        assert!(store.hgetall("n").await.is_err());
    }

    #[tokio::test]
    async fn test_rename_replaces_destination() {
        let store = MemoryStore::new();
        store.hset("old", "0", "stale").await.unwrap();
        store.hset("staged", "0", "fresh").await.unwrap();
        store.expire("staged", 60).await.unwrap();

        store.rename("staged", "old").await.unwrap();

        assert!(!store.exists("staged").await.unwrap());
        assert_eq!(store.hget("old", "0").await.unwrap(), Some("fresh".into()));
        assert!(store.ttl("old").await.is_some());
    }

    #[tokio::test]
    async fn test_rename_missing_source() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.rename("ghost", "other").await,
            Err(CacheError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = MemoryStore::new();
        store.hset("short", "0", "a").await.unwrap();
        store.expire("short", 1).await.unwrap();
        store.hset("long", "0", "b").await.unwrap();
        store.expire("long", 10).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(store.cleanup_expired().await, 1);
        assert_eq!(store.keys().await, vec!["long".to_string()]);
    }
}
