//! Simple Cache Module
//!
//! Key/value cache front-end storing records in the same wire format as the
//! item pool.

use std::collections::BTreeMap;

use crate::cache::shared::CacheCore;
use crate::cache::CacheStats;
use crate::config::Config;
use crate::error::{Protocol, Result};
use crate::expiration::Expiration;
use crate::item::CacheItem;
use crate::storage::Storage;
use crate::value::Value;

// == Simple Cache ==
/// Key/value cache over a [`Storage`] backend.
///
/// Validation errors are raised in the [`Protocol::Simple`] variant.
#[derive(Debug)]
pub struct SimpleCache<S: Storage> {
    core: CacheCore<S>,
}

impl<S: Storage> SimpleCache<S> {
    // == Constructor ==
    pub fn new(storage: S, config: &Config) -> Result<Self> {
        Ok(Self {
            core: CacheCore::new(storage, config, Protocol::Simple)?,
        })
    }

    // == Get ==
    /// Returns the value for `key`, or `default` on a miss.
    pub fn get(&mut self, key: &str, default: Value) -> Result<Value> {
        let stored = self.core.storage_key(key)?;
        Ok(match self.core.fetch(&stored) {
            Some(item) => item.get().clone(),
            None => default,
        })
    }

    // == Set ==
    /// Stores `value` under `key`.
    pub fn set(&mut self, key: &str, value: impl Into<Value>, ttl: Expiration) -> Result<bool> {
        let stored = self.core.storage_key(key)?;
        let item = self.build_item(key, value.into(), ttl)?;
        self.core.store(&stored, &item)
    }

    /// [`set`](Self::set) with a loosely-typed TTL: null or seconds.
    pub fn set_with_ttl_value(
        &mut self,
        key: &str,
        value: impl Into<Value>,
        ttl: &Value,
    ) -> Result<bool> {
        let ttl = Expiration::parse_lifetime(ttl, self.core.protocol())?;
        self.set(key, value, ttl)
    }

    pub fn delete(&mut self, key: &str) -> Result<bool> {
        let stored = self.core.storage_key(key)?;
        Ok(self.core.remove(&stored))
    }

    pub fn has(&mut self, key: &str) -> Result<bool> {
        let stored = self.core.storage_key(key)?;
        Ok(self.core.contains(&stored))
    }

    pub fn clear(&mut self) -> bool {
        self.core.clear()
    }

    // == Multiple ==
    /// Returns a value for every key in the `keys` list, `default` for misses.
    ///
    /// `keys` must be a list of strings.
    pub fn get_multiple(&mut self, keys: &Value, default: Value) -> Result<BTreeMap<String, Value>> {
        let pairs = self.core.keys().validate_list(keys, self.core.protocol())?;

        let mut found = BTreeMap::new();
        for (key, stored) in pairs {
            let value = match self.core.fetch(&stored) {
                Some(item) => item.get().clone(),
                None => default.clone(),
            };
            found.insert(key, value);
        }
        Ok(found)
    }

    /// Stores every entry of `values`. Keys and values are all checked before
    /// anything is written.
    pub fn set_multiple(&mut self, values: &BTreeMap<String, Value>, ttl: Expiration) -> Result<bool> {
        let mut staged = Vec::with_capacity(values.len());
        for (key, value) in values {
            let stored = self.core.storage_key(key)?;
            staged.push((stored, self.build_item(key, value.clone(), ttl)?));
        }

        let mut all_accepted = true;
        for (stored, item) in &staged {
            all_accepted &= self.core.store(stored, item)?;
        }
        Ok(all_accepted)
    }

    /// Removes every key in the `keys` list, returning whether any existed.
    pub fn delete_multiple(&mut self, keys: &Value) -> Result<bool> {
        let pairs = self.core.keys().validate_list(keys, self.core.protocol())?;

        let mut any_removed = false;
        for (_, stored) in pairs {
            any_removed |= self.core.remove(&stored);
        }
        Ok(any_removed)
    }

    pub fn stats(&self) -> &CacheStats {
        self.core.stats()
    }

    pub fn storage(&self) -> &S {
        self.core.storage()
    }

    pub fn storage_mut(&mut self) -> &mut S {
        self.core.storage_mut()
    }

    fn build_item(&self, key: &str, value: Value, ttl: Expiration) -> Result<CacheItem> {
        let mut item = self.core.new_item(key);
        item.set(value)?.expire(ttl);
        Ok(item)
    }
}
