//! Stored Entry Module
//!
//! Defines the structure of one key in the in-process store, with TTL support.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

// == Entry Value ==
/// Data held under a key.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    /// Plain string (counters are strings holding integers)
    String(String),
    /// Field to value hash
    Hash(HashMap<String, String>),
}

// == Stored Entry ==
/// A single key with its value and whole-key expiry.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// The stored value
    pub value: EntryValue,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoredEntry {
    // == Constructor ==
    /// Creates a new entry without expiry.
    pub fn new(value: EntryValue) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Creates an empty hash entry.
    pub fn hash() -> Self {
        Self::new(EntryValue::Hash(HashMap::new()))
    }

    // == Expire ==
    /// Sets the expiry to `ttl_seconds` from now, replacing any previous one.
    pub fn expire_in(&mut self, ttl_seconds: u64) {
        self.expires_at = Some(current_timestamp_ms() + ttl_seconds * 1000);
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// the expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }

    /// Returns remaining TTL in seconds, or None if no expiration is set.
    pub fn ttl_remaining(&self) -> Option<u64> {
        self.ttl_remaining_ms().map(|ms| ms / 1000)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
