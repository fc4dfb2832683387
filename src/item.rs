//! Cache Item Module
//!
//! The cache item entity and its wire record.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::ValueCodec;
use crate::error::{CacheError, Protocol, Result};
use crate::expiration::{Expiration, ExpirationConverter, Ttl};
use crate::value::Value;

// == Wire Record ==
/// Persisted form of a [`CacheItem`]. Field order is part of the format.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct WireRecord {
    key: String,
    normalized: bool,
    value: WirePayload,
    ttl: Ttl,
    is_hit: bool,
}

/// Codec output for normalized values, the raw string otherwise.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WirePayload {
    Raw(String),
    Encoded(Vec<u8>),
}

// == Cache Item ==
/// A key, its value, a TTL and a hit flag.
#[derive(Clone)]
pub struct CacheItem {
    key: String,
    value: Value,
    /// Codec output, present iff the value is normalized
    payload: Option<Vec<u8>>,
    ttl: Ttl,
    is_hit: bool,
    codec: Arc<dyn ValueCodec>,
    protocol: Protocol,
}

impl CacheItem {
    // == Constructor ==
    /// Creates an empty miss for `key`, with a null value and untouched TTL.
    pub fn new(key: impl Into<String>, codec: Arc<dyn ValueCodec>) -> Self {
        let payload = codec.encode(&Value::Null).ok();
        Self {
            key: key.into(),
            value: Value::Null,
            payload,
            ttl: Ttl::Infinite,
            is_hit: false,
            codec,
            protocol: Protocol::default(),
        }
    }

    /// Sets the protocol validation errors are raised in.
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> &Value {
        &self.value
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    pub fn is_hit(&self) -> bool {
        self.is_hit
    }

    /// True when the value needed codec encoding (it is not a plain string).
    pub fn is_normalized(&self) -> bool {
        self.payload.is_some()
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn codec(&self) -> &Arc<dyn ValueCodec> {
        &self.codec
    }

    // == Set ==
    /// Replaces the value.
    ///
    /// Non-string values are encoded right away; if that fails the item keeps
    /// its previous value.
    pub fn set(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        let value = value.into();
        let payload = match value {
            Value::Str(_) => None,
            ref other => Some(self.codec.encode(other)?),
        };

        self.value = value;
        self.payload = payload;
        Ok(self)
    }

    // == Set Hit ==
    /// Marks the item as found. Only the lookup path calls this.
    pub fn set_hit(&mut self) -> &mut Self {
        self.is_hit = true;
        self
    }

    // == Expiration ==
    /// Applies an expiration request, overwriting the previous TTL.
    pub fn expire(&mut self, expiration: Expiration) -> &mut Self {
        self.ttl = ExpirationConverter::convert(expiration);
        self
    }

    /// Expires at `at`, or never for `None`.
    pub fn expires_at(&mut self, at: Option<DateTime<Utc>>) -> &mut Self {
        self.expire(at.into())
    }

    /// Expires after `after`, or never for `None`.
    pub fn expires_after(&mut self, after: Option<Duration>) -> &mut Self {
        self.expire(after.into())
    }

    /// Expires after `secs` seconds.
    pub fn expires_after_secs(&mut self, secs: i64) -> &mut Self {
        self.expire(Expiration::after_secs(secs))
    }

    /// Loosely-typed [`expires_at`](Self::expires_at). The TTL is left alone
    /// when the argument is rejected.
    pub fn expires_at_value(&mut self, at: &Value) -> Result<&mut Self> {
        let expiration = Expiration::parse_instant(at, self.protocol)?;
        Ok(self.expire(expiration))
    }

    /// Loosely-typed [`expires_after`](Self::expires_after). The TTL is left
    /// alone when the argument is rejected.
    pub fn expires_after_value(&mut self, after: &Value) -> Result<&mut Self> {
        let expiration = Expiration::parse_lifetime(after, self.protocol)?;
        Ok(self.expire(expiration))
    }

    // == Wire Round Trip ==
    /// Serializes the item into its wire record.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let value = match (&self.payload, &self.value) {
            (Some(encoded), _) => WirePayload::Encoded(encoded.clone()),
            (None, Value::Str(raw)) => WirePayload::Raw(raw.clone()),
            (None, other) => WirePayload::Encoded(self.codec.encode(other)?),
        };

        let record = WireRecord {
            key: self.key.clone(),
            normalized: matches!(value, WirePayload::Encoded(_)),
            value,
            ttl: self.ttl,
            is_hit: self.is_hit,
        };
        serde_json::to_vec(&record).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    /// Restores an item from its wire record.
    ///
    /// `normalized` is taken from the record, never re-inferred from the
    /// decoded value: a fallback decode yields a string but the item stays
    /// normalized.
    pub fn from_bytes(
        bytes: &[u8],
        codec: Arc<dyn ValueCodec>,
        protocol: Protocol,
    ) -> Result<Self> {
        let record: WireRecord = serde_json::from_slice(bytes)
            .map_err(|e| CacheError::MalformedRecord(e.to_string()))?;

        let (value, payload) = match (record.normalized, record.value) {
            (true, WirePayload::Encoded(encoded)) => (codec.decode(&encoded), Some(encoded)),
            (false, WirePayload::Raw(raw)) => (Value::Str(raw), None),
            (normalized, _) => {
                return Err(CacheError::MalformedRecord(format!(
                    "value shape does not match normalized={}",
                    normalized
                )))
            }
        };

        Ok(Self {
            key: record.key,
            value,
            payload,
            ttl: record.ttl,
            is_hit: record.is_hit,
            codec,
            protocol,
        })
    }

    // == Refresh TTL ==
    /// Overwrites the TTL with what the backend reports as remaining.
    pub(crate) fn refresh_ttl(&mut self, ttl: Ttl) {
        self.ttl = ttl;
    }
}

impl fmt::Debug for CacheItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheItem")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("normalized", &self.is_normalized())
            .field("ttl", &self.ttl)
            .field("is_hit", &self.is_hit)
            .field("codec", &self.codec.name())
            .field("protocol", &self.protocol)
            .finish()
    }
}
