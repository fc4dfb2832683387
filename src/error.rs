//! Error types for the cache core
//!
//! Provides unified error handling using thiserror.

use std::fmt;

use thiserror::Error;

// == Protocol ==
/// Client-facing protocol whose invalid-argument convention an error is raised in.
///
/// The caller decides which one is active and passes it down; validation code
/// never picks it on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    /// Item-oriented protocol (`ItemPool`)
    #[default]
    Pool,
    /// Plain key/value protocol (`SimpleCache`)
    Simple,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Pool => f.write_str("pool"),
            Protocol::Simple => f.write_str("simple"),
        }
    }
}

// == Cache Error Enum ==
/// Unified error type for the cache core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Key failed character set, reserved character or length rules
    #[error("[{protocol}] invalid key `{key}`: {reason}")]
    InvalidKey {
        protocol: Protocol,
        key: String,
        reason: String,
    },

    /// Key-bearing argument has the wrong shape
    #[error("[{protocol}] invalid key type: expected {expected}, got {found}")]
    InvalidKeyType {
        protocol: Protocol,
        expected: &'static str,
        found: &'static str,
    },

    /// Expiration argument is not an instant, a duration or null
    #[error("[{protocol}] invalid expiration: unsupported {found}")]
    InvalidExpiration { protocol: Protocol, found: String },

    /// Value cannot be encoded
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Codec strategy compiled without its backing crate
    #[error("Codec unavailable: {0}")]
    CodecUnavailable(String),

    /// Stored wire record cannot be read back
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CacheError {
    /// Returns the protocol tag of an invalid-argument error.
    pub fn protocol(&self) -> Option<Protocol> {
        match self {
            CacheError::InvalidKey { protocol, .. }
            | CacheError::InvalidKeyType { protocol, .. }
            | CacheError::InvalidExpiration { protocol, .. } => Some(*protocol),
            _ => None,
        }
    }

    /// True for errors caused by a bad caller argument.
    pub fn is_invalid_argument(&self) -> bool {
        self.protocol().is_some()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache core.
pub type Result<T> = std::result::Result<T, CacheError>;
