//! Mini Cache - Value normalization core for a cache abstraction
//!
//! Converts expiration expressions into relative TTLs, encodes application
//! values into storable bytes and validates cache keys.

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod expiration;
pub mod item;
pub mod key;
pub mod storage;
pub mod value;

pub use cache::{CacheStats, ItemPool, SimpleCache};
pub use codec::{CodecKind, CompactBinaryCodec, PlainCodec, ValueCodec};
pub use config::Config;
pub use error::{CacheError, Protocol, Result};
pub use expiration::{Expiration, ExpirationConverter, Ttl};
pub use item::CacheItem;
pub use key::KeyValidator;
pub use storage::{MemoryStorage, Storage};
pub use value::{Value, MAX_DEPTH};
