//! Shared Cache Module
//!
//! Storage plumbing shared by the item pool and the simple cache.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::CacheStats;
use crate::codec::ValueCodec;
use crate::config::Config;
use crate::error::{Protocol, Result};
use crate::expiration::Ttl;
use crate::item::CacheItem;
use crate::key::KeyValidator;
use crate::storage::Storage;

// == Cache Core ==
/// Validates keys, moves wire records in and out of the backend and counts
/// lookups, raising errors in one protocol.
#[derive(Debug)]
pub(crate) struct CacheCore<S: Storage> {
    storage: S,
    keys: KeyValidator,
    codec: Arc<dyn ValueCodec>,
    default_ttl: Option<u64>,
    protocol: Protocol,
    stats: CacheStats,
}

impl<S: Storage> CacheCore<S> {
    // == Constructor ==
    pub fn new(storage: S, config: &Config, protocol: Protocol) -> Result<Self> {
        let keys = config.key_validator(storage.namespace())?;
        let codec = config.codec()?;

        Ok(Self {
            storage,
            keys,
            codec,
            default_ttl: config.default_ttl,
            protocol,
            stats: CacheStats::new(),
        })
    }

    pub fn keys(&self) -> &KeyValidator {
        &self.keys
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Counts a hit served without reading the backend.
    pub fn record_hit(&mut self) {
        self.stats.record_hit();
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Validates `key` and returns its storage key.
    pub fn storage_key(&self, key: &str) -> Result<String> {
        self.keys.validate(key, self.protocol)
    }

    /// Creates an empty item bound to this cache's codec and protocol.
    pub fn new_item(&self, key: &str) -> CacheItem {
        CacheItem::new(key, self.codec.clone()).with_protocol(self.protocol)
    }

    // == Fetch ==
    /// Reads the record under `stored`, marking it as a hit.
    ///
    /// Unreadable records count as misses.
    pub fn fetch(&mut self, stored: &str) -> Option<CacheItem> {
        let Some(bytes) = self.storage.get(stored) else {
            self.stats.record_miss();
            return None;
        };

        match CacheItem::from_bytes(&bytes, self.codec.clone(), self.protocol) {
            Ok(mut item) => {
                if let Some(remaining) = self.storage.ttl(stored).filter(|secs| *secs >= 0) {
                    item.refresh_ttl(Ttl::Seconds(remaining));
                }
                item.set_hit();
                self.stats.record_hit();
                Some(item)
            }
            Err(e) => {
                warn!("Ignoring unreadable record under {}: {}", stored, e);
                self.stats.record_miss();
                None
            }
        }
    }

    // == Store ==
    /// Writes `item` under `stored`, honoring its TTL.
    pub fn store(&mut self, stored: &str, item: &CacheItem) -> Result<bool> {
        let bytes = item.to_bytes()?;

        let accepted = match item.ttl() {
            Ttl::Seconds(secs) => self.storage.setex(stored, bytes, secs),
            Ttl::Never => self.storage.set(stored, bytes),
            Ttl::Infinite => match self.default_ttl {
                Some(secs) => {
                    let secs = i64::try_from(secs).unwrap_or(i64::MAX);
                    self.storage.setex(stored, bytes, secs)
                }
                None => self.storage.set(stored, bytes),
            },
        };

        self.stats.record_write();
        Ok(accepted)
    }

    pub fn remove(&mut self, stored: &str) -> bool {
        self.storage.del(stored)
    }

    pub fn contains(&mut self, stored: &str) -> bool {
        self.storage.exists(stored)
    }

    // == Clear ==
    /// Removes this cache's keys: everything under the prefix, or the whole
    /// backend when there is no prefix.
    pub fn clear(&mut self) -> bool {
        let prefix = self.keys.prefix().to_string();
        if prefix.is_empty() {
            self.storage.flush();
            return true;
        }

        let pattern = format!("{}*", prefix);
        // Glob metacharacters in the prefix widen the match; starts_with narrows it back
        let doomed: Vec<String> = self
            .storage
            .list(Some(&pattern))
            .filter(|key| key.starts_with(&prefix))
            .collect();

        debug!(
            "Clearing {} keys under prefix {} (namespace {:?})",
            doomed.len(),
            prefix,
            self.storage.namespace()
        );
        for key in &doomed {
            self.storage.del(key);
        }
        true
    }
}
