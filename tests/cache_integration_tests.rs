//! Integration Tests for the cache front-ends
//!
//! Exercises items, codecs and keys together through the public API.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use mini_cache::{
    CacheError, CacheItem, CodecKind, Config, Expiration, ItemPool, MemoryStorage, PlainCodec,
    Protocol, SimpleCache, Storage, Ttl, Value, MAX_DEPTH,
};

// == Helper Functions ==

fn config_with(codec: CodecKind, prefix: &str) -> Config {
    Config {
        key_prefix: prefix.to_string(),
        codec,
        ..Config::default()
    }
}

fn sample_value() -> Value {
    let mut profile = BTreeMap::new();
    profile.insert("name".to_string(), Value::from("ada"));
    profile.insert("age".to_string(), Value::Int(36));
    profile.insert("scores".to_string(), Value::List(vec![Value::Float(9.5), Value::Null]));
    Value::Map(profile)
}

fn codecs() -> Vec<CodecKind> {
    let mut kinds = vec![CodecKind::Plain];
    if cfg!(feature = "compact") {
        kinds.push(CodecKind::Compact);
    }
    kinds
}

// == Item Round Trip ==

#[test]
fn test_item_wire_roundtrip_for_each_codec() {
    for kind in codecs() {
        let codec = mini_cache::codec::build(kind).unwrap();

        let mut item = CacheItem::new("profile.7", codec.clone());
        item.set(sample_value()).unwrap().expires_after_secs(30).set_hit();

        let restored = CacheItem::from_bytes(&item.to_bytes().unwrap(), codec, Protocol::Pool)
            .unwrap();
        assert_eq!(restored.key(), "profile.7");
        assert_eq!(restored.get(), &sample_value(), "codec {}", kind);
        let secs = restored.ttl().as_seconds().unwrap();
        assert!((29..=30).contains(&secs));
        assert!(restored.is_hit());
    }
}

#[test]
fn test_expires_at_ten_seconds() {
    let mut item = CacheItem::new("k", Arc::new(PlainCodec::new()));
    item.expires_at(Some(Utc::now() + Duration::seconds(10)));
    let secs = item.ttl().as_seconds().unwrap();
    assert!((9..=10).contains(&secs), "ttl was {}", secs);
}

#[test]
fn test_explicit_never_differs_from_default() {
    let mut item = CacheItem::new("k", Arc::new(PlainCodec::new()));
    assert_eq!(item.ttl(), Ttl::Infinite);
    item.expires_after(None);
    assert_eq!(item.ttl(), Ttl::Never);
}

#[test]
fn test_null_sentinel_for_each_codec() {
    for kind in codecs() {
        let codec = mini_cache::codec::build(kind).unwrap();
        let bytes = codec.encode(&Value::Null).unwrap();
        assert_eq!(codec.decode(&bytes), Value::Null, "codec {}", kind);
    }
}

#[test]
fn test_item_keeps_non_finite_floats_for_each_codec() {
    for kind in codecs() {
        let codec = mini_cache::codec::build(kind).unwrap();
        let value = Value::List(vec![Value::Float(f64::INFINITY), Value::Float(f64::NEG_INFINITY)]);

        let mut item = CacheItem::new("floats", codec.clone());
        item.set(value.clone()).unwrap();

        let restored = CacheItem::from_bytes(&item.to_bytes().unwrap(), codec, Protocol::Pool)
            .unwrap();
        assert_eq!(restored.get(), &value, "codec {}", kind);
    }
}

#[test]
fn test_item_refuses_values_past_depth_bound() {
    for kind in codecs() {
        let codec = mini_cache::codec::build(kind).unwrap();
        let too_deep = (0..=MAX_DEPTH).fold(Value::Int(1), |inner, _| Value::List(vec![inner]));

        let mut item = CacheItem::new("deep", codec);
        item.set(Value::from("kept")).unwrap();
        assert!(matches!(
            item.set(too_deep),
            Err(CacheError::Serialization(_))
        ));
        assert_eq!(item.get(), &Value::from("kept"), "codec {}", kind);
    }
}

// == Item Pool ==

#[test]
fn test_pool_roundtrip_for_each_codec() {
    for kind in codecs() {
        let mut pool = ItemPool::new(MemoryStorage::new(), &config_with(kind, "app_")).unwrap();

        let mut item = pool.item("profile").unwrap();
        item.set(sample_value()).unwrap().expires_after_secs(300);
        assert!(pool.save(&item).unwrap());
        assert!(pool.storage_mut().exists("app_profile"));

        let fetched = pool.get_item("profile").unwrap();
        assert!(fetched.is_hit());
        assert_eq!(fetched.get(), &sample_value());
    }
}

#[test]
fn test_pool_past_expiration_is_passed_through() {
    let mut pool = ItemPool::new(MemoryStorage::new(), &Config::default()).unwrap();

    let mut item = pool.item("stale").unwrap();
    item.set("old").unwrap();
    item.expire(Expiration::At(Utc::now() - Duration::seconds(30)));
    assert!(item.ttl().as_seconds().unwrap() < 0);

    assert!(pool.save(&item).unwrap());
    assert!(!pool.get_item("stale").unwrap().is_hit());
}

#[test]
fn test_pool_clear_keeps_foreign_keys() {
    let mut pool = ItemPool::new(MemoryStorage::new(), &config_with(CodecKind::Plain, "app_"))
        .unwrap();
    pool.storage_mut().set("other_key", b"foreign".to_vec());

    let mut item = pool.item("mine").unwrap();
    item.set(Value::Int(1)).unwrap();
    pool.save(&item).unwrap();

    assert!(pool.clear());
    assert!(!pool.has_item("mine").unwrap());
    assert_eq!(pool.storage_mut().get("other_key"), Some(b"foreign".to_vec()));
}

#[test]
fn test_pool_namespace_becomes_prefix() {
    let mut pool =
        ItemPool::new(MemoryStorage::with_namespace("tenant"), &Config::default()).unwrap();

    let mut item = pool.item("k").unwrap();
    item.set("v").unwrap();
    pool.save(&item).unwrap();

    assert!(pool.storage_mut().exists("tenant.k"));
}

// == Simple Cache ==

#[test]
fn test_simple_cache_shares_wire_format_with_pool() {
    let mut cache = SimpleCache::new(MemoryStorage::new(), &Config::default()).unwrap();
    cache
        .set("shared", sample_value(), Expiration::after_secs(60))
        .unwrap();

    let bytes = cache.storage_mut().get("shared").unwrap();
    let item = CacheItem::from_bytes(&bytes, Arc::new(PlainCodec::new()), Protocol::Simple)
        .unwrap();
    assert_eq!(item.get(), &sample_value());
    assert!(item.is_normalized());
}

#[test]
fn test_simple_cache_errors_use_simple_protocol() {
    let mut cache = SimpleCache::new(MemoryStorage::new(), &Config::default()).unwrap();

    let err = cache.get("bad@key", Value::Null).unwrap_err();
    assert_eq!(err.protocol(), Some(Protocol::Simple));

    let err = cache
        .get_multiple(&Value::Int(3), Value::Null)
        .unwrap_err();
    assert!(matches!(
        err,
        CacheError::InvalidKeyType {
            protocol: Protocol::Simple,
            found: "int",
            ..
        }
    ));
}

#[test]
fn test_simple_cache_plain_string_is_stored_raw() {
    let mut cache = SimpleCache::new(MemoryStorage::new(), &Config::default()).unwrap();
    cache.set("greeting", "hello", Expiration::Unset).unwrap();

    let bytes = cache.storage_mut().get("greeting").unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains(r#""normalized":false,"value":"hello""#), "{}", text);
    assert_eq!(cache.get("greeting", Value::Null).unwrap(), Value::from("hello"));
}

#[test]
fn test_stats_track_lookups() {
    let mut cache = SimpleCache::new(MemoryStorage::new(), &Config::default()).unwrap();
    cache.set("a", Value::Int(1), Expiration::Never).unwrap();

    cache.get("a", Value::Null).unwrap();
    cache.get("b", Value::Null).unwrap();

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.writes, 1);
    assert_eq!(stats.hit_rate(), 0.5);
}
