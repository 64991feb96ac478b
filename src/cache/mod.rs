//! Cache Module
//!
//! Two-tier caching: a bounded in-process memory tier over a persistent
//! disk store, with TTL expiry and pluggable eviction.

mod disk;
mod entry;
mod hybrid;
mod memory;
mod stats;
mod strategy;


// Re-export public types
pub use disk::{DiskStore, PRUNE_TARGET_RATIO};
pub use entry::{current_timestamp_ms, CacheEntry, DiskRecord};
pub use hybrid::HybridCache;
pub use memory::MemoryTier;
pub use stats::{CacheMetrics, DiskStats, EnhancedStats};
pub use strategy::EvictionStrategy;

// == Public Constants ==
/// Maximum key length accepted by the serving surface, in bytes
pub const MAX_KEY_LENGTH: usize = 256;
