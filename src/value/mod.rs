//! Value Module
//!
//! Dynamic application value stored in cache items.

mod repr;

use std::collections::BTreeMap;

use serde::Serialize;

/// Deepest list/map nesting either codec writes or reads back
pub const MAX_DEPTH: usize = 32;

// == Value ==
/// An application value as seen by the cache.
///
/// The serde representation is externally tagged with snake_case tags
/// (`"null"`, `{"int":5}`, `{"list":[...]}`), which both codecs rely on.
/// Non-finite floats are tagged by name in human-readable formats
/// (`{"float":"inf"}`). Deserialization stops past [`MAX_DEPTH`] levels of
/// nesting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(#[serde(serialize_with = "repr::serialize_float")] f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Live handle (file, socket, stream). Never encodable.
    #[serde(skip)]
    Resource(String),
}

impl Value {
    /// Stable type description used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Resource(_) => "resource",
        }
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    // == Find Resource ==
    /// Returns the kind of the first resource found at any depth.
    pub fn find_resource(&self) -> Option<&str> {
        match self {
            Value::Resource(kind) => Some(kind),
            Value::List(items) => items.iter().find_map(Value::find_resource),
            Value::Map(entries) => entries.values().find_map(Value::find_resource),
            _ => None,
        }
    }

    // == Depth ==
    /// Returns true when lists/maps nest more than `limit` levels deep.
    ///
    /// Stops descending once the limit is crossed.
    pub fn nested_deeper_than(&self, limit: usize) -> bool {
        let mut children: Box<dyn Iterator<Item = &Value>> = match self {
            Value::List(items) => Box::new(items.iter()),
            Value::Map(entries) => Box::new(entries.values()),
            _ => return false,
        };
        match limit.checked_sub(1) {
            None => true,
            Some(rest) => children.any(|child| child.nested_deeper_than(rest)),
        }
    }

    // == Literal ==
    /// Wraps raw bytes as a literal string value.
    ///
    /// Non UTF-8 input cannot live in a `String`, so it is kept as `Bytes`.
    pub fn literal(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(s) => Value::Str(s.to_string()),
            Err(_) => Value::Bytes(bytes.to_vec()),
        }
    }

    // == JSON Bridge ==
    /// Renders the value as plain JSON for display.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => Json::from(*f),
            Value::Str(s) => Json::String(s.clone()),
            Value::Bytes(b) => Json::from(b.clone()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Resource(kind) => Json::String(format!("<resource:{}>", kind)),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(entries) => {
                Value::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
