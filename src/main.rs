//! Mini Cache - command line tool for cache wire records
//!
//! # Usage
//! - `mini_cache encode <key> <json-value> [ttl-seconds]` writes a wire record
//!   to stdout
//! - `mini_cache inspect` reads a wire record from stdin and prints it as JSON

use std::env;
use std::io::{self, Read, Write};

use anyhow::{bail, Context};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_cache::{CacheItem, Config, Protocol, Value};

/// Main entry point for the wire record tool.
///
/// Logs go to stderr so stdout stays a clean record or report.
fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = Config::from_env();
    let codec = config.codec().context("building value codec")?;
    info!("Using {} codec", codec.name());

    let args: Vec<String> = env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["encode", key, value, rest @ ..] => {
            let keys = config.key_validator(None)?;
            keys.validate(key, Protocol::Pool)?;

            let json: serde_json::Value = serde_json::from_str(value)
                .with_context(|| format!("value is not JSON: {}", value))?;
            let mut item = CacheItem::new(*key, codec);
            item.set(Value::from(json))?;

            match rest {
                [] => {}
                [ttl] => {
                    let ttl: serde_json::Value = serde_json::from_str(ttl)
                        .with_context(|| format!("ttl is not JSON: {}", ttl))?;
                    item.expires_after_value(&Value::from(ttl))?;
                }
                _ => bail!("too many arguments"),
            }

            let bytes = item.to_bytes()?;
            io::stdout().write_all(&bytes)?;
            info!("Encoded {} ({} bytes)", key, bytes.len());
        }
        ["inspect"] => {
            let mut bytes = Vec::new();
            io::stdin().read_to_end(&mut bytes)?;

            let item = CacheItem::from_bytes(&bytes, codec, Protocol::Pool)?;
            println!("{}", serde_json::to_string_pretty(&inspect_report(&item))?);
        }
        _ => bail!("usage: mini_cache encode <key> <json-value> [ttl-seconds] | mini_cache inspect"),
    }

    Ok(())
}

/// Describes a decoded record. The TTL keeps its wire form.
fn inspect_report(item: &CacheItem) -> serde_json::Value {
    json!({
        "key": item.key(),
        "normalized": item.is_normalized(),
        "value": item.get().to_json(),
        "type": item.get().type_name(),
        "ttl": item.ttl(),
        "isHit": item.is_hit(),
    })
}
