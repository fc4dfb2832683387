//! Expiration Module
//!
//! Normalizes expiration expressions into a relative TTL.

use chrono::{DateTime, Duration, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CacheError, Protocol, Result};
use crate::value::Value;

/// Wire marker for [`Ttl::Infinite`].
pub const INFINITE_MARKER: &str = "inf";

// == Ttl ==
/// Canonical relative time-to-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Never touched by an expiration call
    #[default]
    Infinite,
    /// Caller explicitly asked for no expiration
    Never,
    /// Seconds from now; zero or negative means already expired
    Seconds(i64),
}

impl Ttl {
    pub fn as_seconds(&self) -> Option<i64> {
        match self {
            Ttl::Seconds(secs) => Some(*secs),
            _ => None,
        }
    }
}

// Wire form: integer, null for `Never`, "inf" for `Infinite`.
impl Serialize for Ttl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Ttl::Infinite => serializer.serialize_str(INFINITE_MARKER),
            Ttl::Never => serializer.serialize_none(),
            Ttl::Seconds(secs) => serializer.serialize_i64(*secs),
        }
    }
}

impl<'de> Deserialize<'de> for Ttl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Seconds(i64),
            Marker(String),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(Ttl::Never),
            Some(Raw::Seconds(secs)) => Ok(Ttl::Seconds(secs)),
            Some(Raw::Marker(marker)) if marker == INFINITE_MARKER => Ok(Ttl::Infinite),
            Some(Raw::Marker(marker)) => Err(D::Error::custom(format!(
                "unknown ttl marker `{}`",
                marker
            ))),
        }
    }
}

// == Expiration ==
/// An expiration request, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Leave the TTL at its default
    Unset,
    /// Explicitly never expire
    Never,
    /// Expire at an absolute instant
    At(DateTime<Utc>),
    /// Expire after a relative duration
    After(Duration),
}

impl Expiration {
    /// Relative expiration in whole seconds.
    ///
    /// Values beyond the representable range saturate.
    pub fn after_secs(secs: i64) -> Self {
        let saturated = if secs < 0 { Duration::MIN } else { Duration::MAX };
        Expiration::After(Duration::try_seconds(secs).unwrap_or(saturated))
    }

    // == Parse Instant ==
    /// Validates a loosely-typed "expire at" argument.
    ///
    /// Accepts `Null` (never), an `Int` unix timestamp or an RFC 3339 string.
    pub fn parse_instant(arg: &Value, protocol: Protocol) -> Result<Self> {
        match arg {
            Value::Null => Ok(Expiration::Never),
            Value::Int(ts) => DateTime::from_timestamp(*ts, 0)
                .map(Expiration::At)
                .ok_or_else(|| invalid(protocol, "out of range timestamp")),
            Value::Str(s) => DateTime::parse_from_rfc3339(s)
                .map(|t| Expiration::At(t.with_timezone(&Utc)))
                .map_err(|_| invalid(protocol, "non RFC 3339 string")),
            other => Err(invalid(protocol, other.type_name())),
        }
    }

    // == Parse Lifetime ==
    /// Validates a loosely-typed "expire after" argument.
    ///
    /// Accepts `Null` (never) or an `Int` number of seconds.
    pub fn parse_lifetime(arg: &Value, protocol: Protocol) -> Result<Self> {
        match arg {
            Value::Null => Ok(Expiration::Never),
            Value::Int(secs) => Ok(Expiration::after_secs(*secs)),
            other => Err(invalid(protocol, other.type_name())),
        }
    }
}

impl From<Option<Duration>> for Expiration {
    fn from(after: Option<Duration>) -> Self {
        after.map_or(Expiration::Never, Expiration::After)
    }
}

impl From<Option<DateTime<Utc>>> for Expiration {
    fn from(at: Option<DateTime<Utc>>) -> Self {
        at.map_or(Expiration::Never, Expiration::At)
    }
}

fn invalid(protocol: Protocol, found: &str) -> CacheError {
    CacheError::InvalidExpiration {
        protocol,
        found: found.to_string(),
    }
}

// == Expiration Converter ==
/// Converts expiration requests into [`Ttl`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpirationConverter;

impl ExpirationConverter {
    /// Converts against the current time.
    pub fn convert(expiration: Expiration) -> Ttl {
        Self::convert_at(expiration, Utc::now())
    }

    /// Converts against a fixed `now`.
    ///
    /// Durations are resolved to `now + d` and share the instant path, so both
    /// round to whole seconds the same way. Instants in the past give a
    /// negative TTL.
    pub fn convert_at(expiration: Expiration, now: DateTime<Utc>) -> Ttl {
        match expiration {
            Expiration::Unset => Ttl::Infinite,
            Expiration::Never => Ttl::Never,
            Expiration::At(at) => Ttl::Seconds(at.timestamp() - now.timestamp()),
            Expiration::After(after) => match now.checked_add_signed(after) {
                Some(at) => Self::convert_at(Expiration::At(at), now),
                None => Ttl::Seconds(after.num_seconds()),
            },
        }
    }
}
