//! Item Pool Module
//!
//! Item-oriented cache front-end: callers fetch `CacheItem`s, mutate them and
//! save them back.

use std::collections::BTreeMap;
use std::mem;

use tracing::debug;

use crate::cache::shared::CacheCore;
use crate::cache::CacheStats;
use crate::config::Config;
use crate::error::{Protocol, Result};
use crate::item::CacheItem;
use crate::storage::Storage;

// == Item Pool ==
/// Item-oriented cache over a [`Storage`] backend.
///
/// Validation errors are raised in the [`Protocol::Pool`] variant.
#[derive(Debug)]
pub struct ItemPool<S: Storage> {
    core: CacheCore<S>,
    /// Items queued by `save_deferred`, by key
    deferred: BTreeMap<String, CacheItem>,
}

impl<S: Storage> ItemPool<S> {
    // == Constructor ==
    /// Creates a pool over `storage` using the given configuration.
    pub fn new(storage: S, config: &Config) -> Result<Self> {
        Ok(Self {
            core: CacheCore::new(storage, config, Protocol::Pool)?,
            deferred: BTreeMap::new(),
        })
    }

    /// Creates an empty item for `key` bound to this pool's codec.
    pub fn item(&self, key: &str) -> Result<CacheItem> {
        self.core.storage_key(key)?;
        Ok(self.core.new_item(key))
    }

    // == Get Item ==
    /// Returns the item for `key`: a hit when stored (or deferred), otherwise
    /// an empty miss.
    pub fn get_item(&mut self, key: &str) -> Result<CacheItem> {
        let stored = self.core.storage_key(key)?;

        if let Some(pending) = self.deferred.get(key) {
            let mut item = pending.clone();
            item.set_hit();
            self.core.record_hit();
            return Ok(item);
        }

        Ok(self
            .core
            .fetch(&stored)
            .unwrap_or_else(|| self.core.new_item(key)))
    }

    /// Returns items for all `keys`, in order. No lookup happens unless every
    /// key is valid.
    pub fn get_items(&mut self, keys: &[&str]) -> Result<Vec<CacheItem>> {
        for key in keys {
            self.core.storage_key(key)?;
        }
        keys.iter().map(|key| self.get_item(key)).collect()
    }

    pub fn has_item(&mut self, key: &str) -> Result<bool> {
        let stored = self.core.storage_key(key)?;
        Ok(self.deferred.contains_key(key) || self.core.contains(&stored))
    }

    // == Save ==
    /// Persists `item` immediately.
    pub fn save(&mut self, item: &CacheItem) -> Result<bool> {
        let stored = self.core.storage_key(item.key())?;
        self.deferred.remove(item.key());
        self.core.store(&stored, item)
    }

    /// Queues `item` until the next [`commit`](Self::commit).
    pub fn save_deferred(&mut self, item: CacheItem) -> Result<bool> {
        self.core.storage_key(item.key())?;
        self.deferred.insert(item.key().to_string(), item);
        Ok(true)
    }

    /// Persists every deferred item. Returns false if the backend refused any.
    pub fn commit(&mut self) -> Result<bool> {
        let pending = mem::take(&mut self.deferred);
        debug!("Committing {} deferred items", pending.len());

        let mut all_accepted = true;
        for item in pending.values() {
            let stored = self.core.storage_key(item.key())?;
            all_accepted &= self.core.store(&stored, item)?;
        }
        Ok(all_accepted)
    }

    // == Delete ==
    /// Removes `key`, returning whether anything was there.
    pub fn delete_item(&mut self, key: &str) -> Result<bool> {
        let stored = self.core.storage_key(key)?;
        let was_deferred = self.deferred.remove(key).is_some();
        Ok(self.core.remove(&stored) || was_deferred)
    }

    /// Removes all `keys`. Nothing is removed unless every key is valid.
    pub fn delete_items(&mut self, keys: &[&str]) -> Result<bool> {
        let stored = keys
            .iter()
            .map(|key| self.core.storage_key(key))
            .collect::<Result<Vec<_>>>()?;

        let mut any_removed = false;
        for (key, stored) in keys.iter().zip(&stored) {
            let was_deferred = self.deferred.remove(*key).is_some();
            any_removed |= self.core.remove(stored) || was_deferred;
        }
        Ok(any_removed)
    }

    /// Drops deferred items and every key of this pool.
    pub fn clear(&mut self) -> bool {
        self.deferred.clear();
        self.core.clear()
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
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::expiration::Ttl;
    use crate::storage::MemoryStorage;
    use crate::value::Value;

    fn pool() -> ItemPool<MemoryStorage> {
        ItemPool::new(MemoryStorage::new(), &Config::default()).unwrap()
    }

    #[test]
    fn test_miss_returns_empty_item() {
        let mut pool = pool();
        let item = pool.get_item("missing").unwrap();

        assert!(!item.is_hit());
        assert_eq!(item.get(), &Value::Null);
        assert_eq!(pool.stats().misses, 1);
    }

    #[test]
    fn test_save_then_get_is_hit() {
        let mut pool = pool();
        let mut item = pool.item("answer").unwrap();
        item.set(Value::Int(42)).unwrap().expires_after_secs(60);
        assert!(pool.save(&item).unwrap());

        let fetched = pool.get_item("answer").unwrap();
        assert!(fetched.is_hit());
        assert_eq!(fetched.get(), &Value::Int(42));
        let secs = fetched.ttl().as_seconds().unwrap();
        assert!((59..=60).contains(&secs));
        assert_eq!(pool.stats().hits, 1);
        assert_eq!(pool.stats().writes, 1);
    }

    #[test]
    fn test_invalid_key_uses_pool_protocol() {
        let mut pool = pool();
        let err = pool.get_item("bad key").unwrap_err();
        assert!(matches!(
            err,
            CacheError::InvalidKey { protocol: Protocol::Pool, .. }
        ));
    }

    #[test]
    fn test_deferred_items() {
        let mut pool = pool();
        let mut item = pool.item("later").unwrap();
        item.set("queued").unwrap();

        pool.save_deferred(item).unwrap();
        assert!(pool.has_item("later").unwrap());
        assert!(pool.storage().is_empty());
        assert!(pool.get_item("later").unwrap().is_hit());
        assert_eq!(pool.stats().hits, 1);
        assert_eq!(pool.stats().misses, 0);

        assert!(pool.commit().unwrap());
        assert_eq!(pool.storage().len(), 1);
        assert_eq!(pool.get_item("later").unwrap().get(), &Value::from("queued"));
    }

    #[test]
    fn test_delete_items_is_all_or_nothing() {
        let mut pool = pool();
        for key in ["a", "b"] {
            let mut item = pool.item(key).unwrap();
            item.set(key).unwrap();
            pool.save(&item).unwrap();
        }

        assert!(pool.delete_items(&["a", "b:c"]).is_err());
        assert!(pool.has_item("a").unwrap());

        assert!(pool.delete_items(&["a", "b"]).unwrap());
        assert!(!pool.has_item("a").unwrap());
        assert!(!pool.has_item("b").unwrap());
    }

    #[test]
    fn test_never_and_default_ttl() {
        let config = Config {
            default_ttl: Some(120),
            ..Config::default()
        };
        let mut pool = ItemPool::new(MemoryStorage::new(), &config).unwrap();

        let untouched = pool.item("untouched").unwrap();
        pool.save(&untouched).unwrap();
        let mut never = pool.item("never").unwrap();
        never.expires_after(None);
        pool.save(&never).unwrap();

        let ttl = pool.storage_mut().ttl("untouched").unwrap();
        assert!((119..=120).contains(&ttl));
        assert_eq!(pool.storage_mut().ttl("never"), Some(-1));
        assert_eq!(pool.get_item("never").unwrap().ttl(), Ttl::Never);
    }

    #[test]
    fn test_unreadable_record_is_miss() {
        let mut pool = pool();
        pool.storage_mut().set("broken", b"garbage".to_vec());

        let item = pool.get_item("broken").unwrap();
        assert!(!item.is_hit());
        assert_eq!(pool.stats().misses, 1);
    }
}
