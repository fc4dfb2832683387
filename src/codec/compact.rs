//! Compact Binary Codec
//!
//! bincode encoding of the tagged value representation, framed by a two byte
//! header (marker, format version). Requires the `compact` feature.

#[cfg(feature = "compact")]
use tracing::debug;

use crate::codec::{ensure_encodable, ValueCodec};
use crate::error::{CacheError, Result};
use crate::value::Value;

// == Wire Format ==
/// Marker byte followed by the format version
pub const COMPACT_HEADER: [u8; 2] = [0xB1, 0x01];

/// Encoded form of `Value::Null`
pub const COMPACT_NULL: [u8; 3] = [0xB1, 0x01, 0x00];

/// Upper bound on a single decoded payload
#[cfg(feature = "compact")]
const DECODE_LIMIT: usize = 64 * 1024 * 1024;

// == Compact Binary Codec ==
/// Space-efficient binary codec.
#[derive(Debug, Clone, Copy)]
pub struct CompactBinaryCodec {
    _private: (),
}

impl CompactBinaryCodec {
    // == Constructor ==
    /// Creates the codec, failing when built without the `compact` feature.
    pub fn new() -> Result<Self> {
        if cfg!(feature = "compact") {
            Ok(Self { _private: () })
        } else {
            Err(CacheError::CodecUnavailable(
                "compact codec requires the `compact` feature (bincode)".to_string(),
            ))
        }
    }
}

#[cfg(feature = "compact")]
fn config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<DECODE_LIMIT>()
}

impl ValueCodec for CompactBinaryCodec {
    fn name(&self) -> &'static str {
        "compact"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        ensure_encodable(value)?;

        if matches!(value, Value::Null) {
            return Ok(COMPACT_NULL.to_vec());
        }
        encode_payload(value)
    }

    fn decode(&self, bytes: &[u8]) -> Value {
        if bytes == COMPACT_NULL {
            return Value::Null;
        }
        match bytes.strip_prefix(&COMPACT_HEADER[..]) {
            Some(payload) => decode_payload(payload).unwrap_or_else(|| Value::literal(bytes)),
            None => Value::literal(bytes),
        }
    }
}

#[cfg(feature = "compact")]
fn encode_payload(value: &Value) -> Result<Vec<u8>> {
    let mut out = COMPACT_HEADER.to_vec();
    let payload = bincode::serde::encode_to_vec(value, config())
        .map_err(|e| CacheError::Serialization(e.to_string()))?;
    out.extend_from_slice(&payload);
    Ok(out)
}

#[cfg(not(feature = "compact"))]
fn encode_payload(_value: &Value) -> Result<Vec<u8>> {
    Err(CacheError::CodecUnavailable(
        "compact codec requires the `compact` feature (bincode)".to_string(),
    ))
}

#[cfg(feature = "compact")]
fn decode_payload(payload: &[u8]) -> Option<Value> {
    match bincode::serde::decode_from_slice::<Value, _>(payload, config()) {
        Ok((value, read)) if read == payload.len() => Some(value),
        Ok((_, read)) => {
            debug!(
                "Compact decode left {} trailing bytes, falling back to literal",
                payload.len() - read
            );
            None
        }
        Err(e) => {
            debug!("Compact decode fell back to literal: {}", e);
            None
        }
    }
}

#[cfg(not(feature = "compact"))]
fn decode_payload(_payload: &[u8]) -> Option<Value> {
    None
}
