//! Size-bounded LRU cache with TTL, tags and optional compression
//!
//! - [`LruStore`]: the byte-budgeted store itself
//! - [`CacheConfig`]: per-write policy (TTL, revalidation window, tags,
//!   compression)
//! - [`StoreStats`]: counters and usage snapshot

mod config;
mod entry;
mod stats;
mod store;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use stats::StoreStats;
pub use store::{Lookup, LruStore};
