//! Cache Module
//!
//! Protocol front-ends built on the item, codec and key components.

mod shared;
mod pool;
mod simple;
mod stats;

// Re-export public types
pub use pool::ItemPool;
pub use simple::SimpleCache;
pub use stats::CacheStats;
