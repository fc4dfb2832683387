//! Memory Storage Module
//!
//! HashMap-backed reference backend with lazy TTL expiration.

use std::collections::HashMap;

use tracing::debug;

use crate::storage::{glob_match, Storage, StoredEntry};

// == Memory Storage ==
/// In-process backend. Expired entries are dropped when touched; nothing is
/// ever evicted for space.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    /// Key-value storage
    entries: HashMap<String, StoredEntry>,
    namespace: Option<String>,
}

impl MemoryStorage {
    // == Constructor ==
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty backend reporting the given namespace.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            namespace: Some(namespace.into()),
        }
    }

    // == Live Entry ==
    /// Returns the entry for `key`, removing it first if it has expired.
    fn live_entry(&mut self, key: &str) -> Option<&StoredEntry> {
        if self.entries.get(key).is_some_and(StoredEntry::is_expired) {
            self.entries.remove(key);
            debug!("Dropped expired key {}", key);
            return None;
        }
        self.entries.get(key)
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before - self.entries.len()
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        self.live_entry(key).map(|entry| entry.value.clone())
    }

    fn set(&mut self, key: &str, value: Vec<u8>) -> bool {
        self.entries
            .insert(key.to_string(), StoredEntry::new(value, None));
        true
    }

    fn setex(&mut self, key: &str, value: Vec<u8>, ttl_secs: i64) -> bool {
        self.entries
            .insert(key.to_string(), StoredEntry::new(value, Some(ttl_secs)));
        true
    }

    fn del(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => !entry.is_expired(),
            None => false,
        }
    }

    fn ttl(&mut self, key: &str) -> Option<i64> {
        self.live_entry(key)
            .map(|entry| entry.ttl_remaining().unwrap_or(-1))
    }

    fn exists(&mut self, key: &str) -> bool {
        self.live_entry(key).is_some()
    }

    fn list<'a>(&'a self, pattern: Option<&'a str>) -> Box<dyn Iterator<Item = String> + 'a> {
        Box::new(
            self.entries
                .iter()
                .filter(|(_, entry)| !entry.is_expired())
                .filter(move |(key, _)| pattern.map_or(true, |p| glob_match(p, key)))
                .map(|(key, _)| key.clone()),
        )
    }

    fn flush(&mut self) {
        self.entries.clear();
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}
