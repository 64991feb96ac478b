//! Hybrid Cache - a two-tier key/value cache
//!
//! Combines a bounded in-process memory tier with a persistent disk store:
//! TTL expiry, LRU/LFU/TTL eviction, write-through sets, read promotion,
//! pattern invalidation and call-level memoization.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod memo;
pub mod models;

pub use api::AppState;
pub use cache::{DiskStore, EvictionStrategy, HybridCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use memo::{cache_keygen, CacheLayer, CallArgs, Memoized};
