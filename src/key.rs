//! Key Validation Module
//!
//! Validates raw cache keys and applies the storage prefix.

use regex::Regex;
use tracing::debug;

use crate::error::{CacheError, Protocol, Result};
use crate::value::Value;

// == Public Constants ==
/// Characters a key may be made of, as a regex class
pub const DEFAULT_ALLOWED_CLASS: &str = r"[A-Za-z0-9_.\-{}()/\\@:]";

/// Characters reserved by the key/value protocols
pub const DEFAULT_RESERVED_CHARS: &str = r"{}()/\@:";

/// Maximum allowed key length in characters
pub const MAX_KEY_LENGTH: usize = 256;

// == Key Validator ==
/// Validates keys against a character class, reserved characters and a length
/// limit, then prefixes them.
#[derive(Debug, Clone)]
pub struct KeyValidator {
    /// Anchored whole-key pattern built from the allowed class
    allowed: Regex,
    reserved: String,
    max_len: usize,
    prefix: String,
}

impl KeyValidator {
    // == Constructor ==
    /// Creates a validator.
    ///
    /// # Arguments
    /// * `allowed_class` - Regex expression matching one allowed character
    /// * `reserved` - Characters that may never appear in a key
    /// * `max_len` - Maximum key length in characters
    /// * `prefix` - Prepended to every validated key (may be empty)
    pub fn new(
        allowed_class: &str,
        reserved: &str,
        max_len: usize,
        prefix: impl Into<String>,
    ) -> Result<Self> {
        let allowed = Regex::new(&format!("^(?:{})+$", allowed_class)).map_err(|e| {
            CacheError::Config(format!("invalid key class `{}`: {}", allowed_class, e))
        })?;

        Ok(Self {
            allowed,
            reserved: reserved.to_string(),
            max_len,
            prefix: prefix.into(),
        })
    }

    /// Creates a validator with the default rules and the given prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            allowed: default_pattern(),
            reserved: DEFAULT_RESERVED_CHARS.to_string(),
            max_len: MAX_KEY_LENGTH,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    // == Validate ==
    /// Validates `key` and returns the prefixed storage key.
    pub fn validate(&self, key: &str, protocol: Protocol) -> Result<String> {
        if !self.allowed.is_match(key) {
            return Err(self.reject(key, protocol, "contains characters outside the allowed set"));
        }

        if let Some(c) = key.chars().find(|c| self.reserved.contains(*c)) {
            return Err(self.reject(
                key,
                protocol,
                &format!("contains reserved character '{}'", c),
            ));
        }

        if key.chars().count() > self.max_len {
            return Err(self.reject(
                key,
                protocol,
                &format!("exceeds maximum length of {} characters", self.max_len),
            ));
        }

        Ok(format!("{}{}", self.prefix, key))
    }

    // == Validate Value ==
    /// Validates a loosely-typed key argument.
    ///
    /// Anything that is not a string fails with `InvalidKeyType` before the
    /// character rules run.
    pub fn validate_value(&self, key: &Value, protocol: Protocol) -> Result<String> {
        match key {
            Value::Str(key) => self.validate(key, protocol),
            other => Err(CacheError::InvalidKeyType {
                protocol,
                expected: "string",
                found: other.type_name(),
            }),
        }
    }

    // == Validate List ==
    /// Validates a loosely-typed list of keys.
    ///
    /// Returns `(key, storage_key)` pairs in input order.
    pub fn validate_list(&self, keys: &Value, protocol: Protocol) -> Result<Vec<(String, String)>> {
        let Value::List(items) = keys else {
            return Err(CacheError::InvalidKeyType {
                protocol,
                expected: "list",
                found: keys.type_name(),
            });
        };

        items
            .iter()
            .map(|item| {
                let stored = self.validate_value(item, protocol)?;
                // validate_value only succeeds for strings
                let key = item.as_str().unwrap_or_default().to_string();
                Ok((key, stored))
            })
            .collect()
    }

    fn reject(&self, key: &str, protocol: Protocol, reason: &str) -> CacheError {
        debug!("Rejected key {:?}: {}", key, reason);
        CacheError::InvalidKey {
            protocol,
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Default for KeyValidator {
    fn default() -> Self {
        Self::with_prefix("")
    }
}

fn default_pattern() -> Regex {
    Regex::new(&format!("^(?:{})+$", DEFAULT_ALLOWED_CLASS)).expect("default key class is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_key_is_prefixed() {
        let validator = KeyValidator::with_prefix("app_");
        assert_eq!(
            validator.validate("user.42", Protocol::Pool).unwrap(),
            "app_user.42"
        );
    }

    #[test]
    fn test_empty_prefix() {
        let validator = KeyValidator::default();
        assert_eq!(validator.validate("abc", Protocol::Pool).unwrap(), "abc");
    }

    #[test]
    fn test_rejects_outside_class() {
        let validator = KeyValidator::default();
        let err = validator.validate("has space", Protocol::Simple).unwrap_err();
        assert!(matches!(
            err,
            CacheError::InvalidKey { protocol: Protocol::Simple, .. }
        ));
    }

    #[test]
    fn test_rejects_empty_key() {
        let validator = KeyValidator::default();
        assert!(validator.validate("", Protocol::Pool).is_err());
    }

    #[test]
    fn test_rejects_reserved_characters() {
        let validator = KeyValidator::default();
        for key in ["a{b", "a}b", "a(b", "a)b", "a/b", "a\\b", "a@b", "a:b"] {
            let err = validator.validate(key, Protocol::Pool).unwrap_err();
            match err {
                CacheError::InvalidKey { reason, .. } => {
                    assert!(reason.contains("reserved"), "{}: {}", key, reason)
                }
                other => panic!("unexpected error for {}: {:?}", key, other),
            }
        }
    }

    #[test]
    fn test_rejects_too_long() {
        let validator = KeyValidator::new("[a-z]", "", 4, "p:").unwrap();
        assert_eq!(validator.validate("abcd", Protocol::Pool).unwrap(), "p:abcd");
        assert!(matches!(
            validator.validate("abcde", Protocol::Pool),
            Err(CacheError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_class_is_whole_string_match() {
        let validator = KeyValidator::new("[a-z]", "", 64, "").unwrap();
        assert!(validator.validate("abc1", Protocol::Pool).is_err());
        assert!(validator.validate("1abc", Protocol::Pool).is_err());
    }

    #[test]
    fn test_invalid_class_expression() {
        let result = KeyValidator::new("[a-z", "", 64, "");
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_non_string_key_is_type_error() {
        let validator = KeyValidator::default();
        let err = validator.validate_value(&Value::Int(7), Protocol::Simple).unwrap_err();
        assert_eq!(
            err,
            CacheError::InvalidKeyType {
                protocol: Protocol::Simple,
                expected: "string",
                found: "int",
            }
        );
    }

    #[test]
    fn test_validate_list() {
        let validator = KeyValidator::with_prefix("ns_");
        let keys = Value::List(vec![Value::from("a"), Value::from("b")]);
        let pairs = validator.validate_list(&keys, Protocol::Simple).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "ns_a".to_string()),
                ("b".to_string(), "ns_b".to_string())
            ]
        );

        let err = validator
            .validate_list(&Value::from("a"), Protocol::Simple)
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidKeyType { expected: "list", .. }));

        let mixed = Value::List(vec![Value::from("a"), Value::Null]);
        assert!(matches!(
            validator.validate_list(&mixed, Protocol::Simple),
            Err(CacheError::InvalidKeyType { found: "null", .. })
        ));
    }
}
