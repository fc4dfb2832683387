//! Storage Module
//!
//! Backend contract consumed by the cache front-ends, plus an in-memory
//! reference backend.

mod entry;
mod memory;

pub use entry::{current_timestamp_ms, StoredEntry};
pub use memory::MemoryStorage;

// == Storage ==
/// Opaque key-value store with TTL support.
///
/// Keys reach the backend already validated and prefixed; values are wire
/// records produced by `CacheItem::to_bytes`.
pub trait Storage {
    /// Returns the bytes stored under `key`, if present and not expired.
    fn get(&mut self, key: &str) -> Option<Vec<u8>>;

    /// Stores bytes without expiry.
    fn set(&mut self, key: &str, value: Vec<u8>) -> bool;

    /// Stores bytes expiring after `ttl_secs`. Non-positive values are passed
    /// through as given.
    fn setex(&mut self, key: &str, value: Vec<u8>, ttl_secs: i64) -> bool;

    /// Removes `key`. Returns false if it was not present.
    fn del(&mut self, key: &str) -> bool;

    /// Remaining TTL in seconds; `Some(-1)` without expiry, `None` if missing.
    fn ttl(&mut self, key: &str) -> Option<i64>;

    fn exists(&mut self, key: &str) -> bool;

    /// Lazily lists live keys, optionally filtered by a `*`/`?` glob.
    fn list<'a>(&'a self, pattern: Option<&'a str>) -> Box<dyn Iterator<Item = String> + 'a>;

    /// Removes every key.
    fn flush(&mut self);

    fn namespace(&self) -> Option<&str>;
}

// == Glob Matching ==
/// Matches `text` against a glob where `*` is any run and `?` any one char.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                // Let the last star swallow one more char
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}
