//! Plain Codec
//!
//! JSON text encoding of the tagged value representation.

use tracing::debug;

use crate::codec::{ensure_encodable, ValueCodec};
use crate::error::{CacheError, Result};
use crate::value::Value;

// == Wire Sentinels ==
/// Encoded form of `Value::Null`
pub const PLAIN_NULL: &[u8] = br#""null""#;

/// Encoded form of `Value::Bool(false)`
pub const PLAIN_FALSE: &[u8] = br#"{"bool":false}"#;

// == Plain Codec ==
/// Human-readable JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCodec;

impl PlainCodec {
    pub fn new() -> Self {
        Self
    }
}

impl ValueCodec for PlainCodec {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        ensure_encodable(value)?;

        match value {
            Value::Null => Ok(PLAIN_NULL.to_vec()),
            Value::Bool(false) => Ok(PLAIN_FALSE.to_vec()),
            _ => serde_json::to_vec(value).map_err(|e| CacheError::Serialization(e.to_string())),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Value {
        // Too short to be any tagged encoding
        if bytes.len() <= 1 {
            return Value::literal(bytes);
        }
        if bytes == PLAIN_NULL {
            return Value::Null;
        }
        if bytes == PLAIN_FALSE {
            return Value::Bool(false);
        }

        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => value,
            Err(e) => {
                debug!("Plain decode fell back to literal: {}", e);
                Value::literal(bytes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::MAX_DEPTH;
    use std::collections::BTreeMap;

    #[test]
    fn test_null_and_false_sentinels() {
        let codec = PlainCodec::new();
        assert_eq!(codec.encode(&Value::Null).unwrap(), PLAIN_NULL);
        assert_eq!(codec.encode(&Value::Bool(false)).unwrap(), PLAIN_FALSE);
        assert_eq!(codec.decode(PLAIN_NULL), Value::Null);
        assert_eq!(codec.decode(PLAIN_FALSE), Value::Bool(false));
    }

    #[test]
    fn test_sentinels_match_general_encoding() {
        assert_eq!(serde_json::to_vec(&Value::Null).unwrap(), PLAIN_NULL);
        assert_eq!(serde_json::to_vec(&Value::Bool(false)).unwrap(), PLAIN_FALSE);
    }

    #[test]
    fn test_roundtrip_nested() {
        let codec = PlainCodec::new();
        let mut map = BTreeMap::new();
        map.insert("n".to_string(), Value::Float(1.5));
        map.insert("b".to_string(), Value::Bytes(vec![0, 255]));
        let value = Value::List(vec![Value::Int(-7), Value::Map(map), Value::Bool(true)]);

        let bytes = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&bytes), value);
    }

    #[test]
    fn test_short_input_is_verbatim() {
        let codec = PlainCodec::new();
        assert_eq!(codec.decode(b""), Value::Str(String::new()));
        assert_eq!(codec.decode(b"5"), Value::Str("5".to_string()));
    }

    #[test]
    fn test_malformed_input_falls_back() {
        let codec = PlainCodec::new();
        assert_eq!(
            codec.decode(b"just a string"),
            Value::Str("just a string".to_string())
        );
        // Valid JSON that is not a tagged value is still a literal
        assert_eq!(codec.decode(b"null"), Value::Str("null".to_string()));
        assert_eq!(codec.decode(&[0xc3, 0x28]), Value::Bytes(vec![0xc3, 0x28]));
    }

    fn nest(levels: usize) -> Value {
        (0..levels).fold(Value::Int(1), |inner, _| Value::List(vec![inner]))
    }

    #[test]
    fn test_non_finite_floats_roundtrip() {
        let codec = PlainCodec::new();
        for f in [f64::INFINITY, f64::NEG_INFINITY] {
            let bytes = codec.encode(&Value::Float(f)).unwrap();
            assert_eq!(codec.decode(&bytes), Value::Float(f));
        }

        let bytes = codec.encode(&Value::Float(f64::NAN)).unwrap();
        assert_eq!(bytes, br#"{"float":"nan"}"#);
        assert!(matches!(codec.decode(&bytes), Value::Float(f) if f.is_nan()));
    }

    #[test]
    fn test_depth_boundary() {
        let codec = PlainCodec::new();
        let deepest = nest(MAX_DEPTH);
        let bytes = codec.encode(&deepest).unwrap();
        assert_eq!(codec.decode(&bytes), deepest);

        assert!(matches!(
            codec.encode(&nest(MAX_DEPTH + 1)),
            Err(CacheError::Serialization(_))
        ));
    }

    #[test]
    fn test_too_deep_input_falls_back() {
        let codec = PlainCodec::new();
        let mut text = r#"{"list":["#.repeat(MAX_DEPTH + 1);
        text.push_str("\"null\"");
        text.push_str(&"]}".repeat(MAX_DEPTH + 1));
        assert_eq!(codec.decode(text.as_bytes()), Value::Str(text));
    }

    #[test]
    fn test_resource_is_rejected() {
        let codec = PlainCodec::new();
        let err = codec
            .encode(&Value::Resource("stream".to_string()))
            .unwrap_err();
        assert!(matches!(err, CacheError::Serialization(msg) if msg.contains("stream")));
    }
}
