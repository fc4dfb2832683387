//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::sync::Arc;

use crate::codec::{self, CodecKind, ValueCodec};
use crate::error::Result;
use crate::key::{KeyValidator, DEFAULT_ALLOWED_CLASS, DEFAULT_RESERVED_CHARS, MAX_KEY_LENGTH};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Prefix prepended to every validated key
    pub key_prefix: String,
    /// Maximum key length in characters
    pub max_key_length: usize,
    /// Value codec strategy
    pub codec: CodecKind,
    /// TTL in seconds applied to items saved without an expiration, None = no expiry
    pub default_ttl: Option<u64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_KEY_PREFIX` - Key prefix (default: empty)
    /// - `CACHE_MAX_KEY_LENGTH` - Maximum key length (default: 256)
    /// - `CACHE_CODEC` - `plain` or `compact` (default: plain)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: unset)
    pub fn from_env() -> Self {
        Self {
            key_prefix: env::var("CACHE_KEY_PREFIX").unwrap_or_default(),
            max_key_length: env::var("CACHE_MAX_KEY_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_KEY_LENGTH),
            codec: env::var("CACHE_CODEC")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            default_ttl: env::var("CACHE_DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Builds the key validator for this configuration.
    ///
    /// An empty `key_prefix` falls back to `namespace` followed by a dot.
    pub fn key_validator(&self, namespace: Option<&str>) -> Result<KeyValidator> {
        let prefix = match (self.key_prefix.is_empty(), namespace) {
            (true, Some(ns)) if !ns.is_empty() => format!("{}.", ns),
            _ => self.key_prefix.clone(),
        };
        KeyValidator::new(
            DEFAULT_ALLOWED_CLASS,
            DEFAULT_RESERVED_CHARS,
            self.max_key_length,
            prefix,
        )
    }

    /// Builds the configured value codec.
    pub fn codec(&self) -> Result<Arc<dyn ValueCodec>> {
        codec::build(self.codec)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_prefix: String::new(),
            max_key_length: MAX_KEY_LENGTH,
            codec: CodecKind::Plain,
            default_ttl: None,
        }
    }
}
