//! Codec Module
//!
//! Value codecs turning [`Value`]s into storable bytes and back.
//!
//! Decoding never fails: bytes that are not a valid encoding come back as a
//! literal string, so unrelated cached strings survive a decode pass. Both
//! codecs share one nesting bound, [`MAX_DEPTH`], when writing and reading.

mod compact;
mod plain;


use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{CacheError, Result};
use crate::value::{Value, MAX_DEPTH};

// Re-export public types
pub use compact::{CompactBinaryCodec, COMPACT_HEADER, COMPACT_NULL};
pub use plain::{PlainCodec, PLAIN_FALSE, PLAIN_NULL};

// == Value Codec ==
/// Paired encode/decode strategy for cache values.
pub trait ValueCodec: fmt::Debug + Send + Sync {
    /// Short strategy name.
    fn name(&self) -> &'static str;

    /// Encodes a value. Fails for values holding a resource.
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Decodes bytes, falling back to a literal string on malformed input.
    fn decode(&self, bytes: &[u8]) -> Value;
}

/// Rejects values that nest past [`MAX_DEPTH`] or hold a live resource
/// anywhere inside.
pub(crate) fn ensure_encodable(value: &Value) -> Result<()> {
    if value.nested_deeper_than(MAX_DEPTH) {
        return Err(CacheError::Serialization(format!(
            "value nested deeper than {} levels",
            MAX_DEPTH
        )));
    }
    match value.find_resource() {
        Some(kind) => Err(CacheError::Serialization(format!(
            "cannot serialize resource of kind `{}`",
            kind
        ))),
        None => Ok(()),
    }
}

// == Codec Kind ==
/// Selectable codec strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodecKind {
    #[default]
    Plain,
    Compact,
}

impl FromStr for CodecKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "json" => Ok(CodecKind::Plain),
            "compact" | "binary" => Ok(CodecKind::Compact),
            other => Err(CacheError::Config(format!("unknown codec `{}`", other))),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecKind::Plain => f.write_str("plain"),
            CodecKind::Compact => f.write_str("compact"),
        }
    }
}

// == Build ==
/// Builds a shareable codec of the given kind.
pub fn build(kind: CodecKind) -> Result<Arc<dyn ValueCodec>> {
    match kind {
        CodecKind::Plain => Ok(Arc::new(PlainCodec::new())),
        CodecKind::Compact => Ok(Arc::new(CompactBinaryCodec::new()?)),
    }
}
