//! Cache Statistics Module
//!
//! Tracks per-instance counters and derives the reported hit ratios.

use std::path::PathBuf;

use serde::Serialize;

use crate::cache::EvictionStrategy;

// == Cache Metrics ==
/// Monotonically increasing counters owned by one hybrid cache instance.
///
/// Counters reset only when the instance is recreated; `clear` does not
/// touch them.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheMetrics {
    /// Gets served from the memory tier
    pub memory_hits: u64,
    /// Gets that had to fall through to disk (absent or expired in memory)
    pub memory_misses: u64,
    /// Fall-through gets served from disk
    pub disk_hits: u64,
    /// Gets absent from both tiers
    pub disk_misses: u64,
    /// Completed set operations
    pub sets: u64,
    /// Keys removed through invalidate / invalidate_pattern
    pub invalidations: u64,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Ratios ==
    /// memory_hits / (memory_hits + memory_misses), 0 when idle.
    pub fn memory_hit_ratio(&self) -> f64 {
        ratio(self.memory_hits, self.memory_hits + self.memory_misses)
    }

    /// disk_hits / (disk_hits + disk_misses), 0 when idle.
    pub fn disk_hit_ratio(&self) -> f64 {
        ratio(self.disk_hits, self.disk_hits + self.disk_misses)
    }

    /// Hits from either tier over all gets. Every get increments exactly one
    /// of memory_hits / memory_misses, so the denominator is the get count.
    pub fn overall_hit_ratio(&self) -> f64 {
        ratio(
            self.memory_hits + self.disk_hits,
            self.memory_hits + self.memory_misses,
        )
    }
}

fn ratio(hits: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Disk Stats ==
/// Snapshot of the disk store directory.
#[derive(Debug, Clone, Serialize)]
pub struct DiskStats {
    /// Entry files currently on disk
    pub total_entries: usize,
    /// Entry files whose record has not yet expired
    pub active_entries: usize,
    /// Entry files that are expired or unreadable
    pub expired_entries: usize,
    /// Sum of entry file sizes in bytes
    pub total_size_bytes: u64,
    /// The store's directory
    pub cache_dir: PathBuf,
}

// == Enhanced Stats ==
/// Full per-instance report: entry counts for both tiers, raw counters,
/// derived ratios and the active eviction strategy.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancedStats {
    pub memory_entries: usize,
    pub disk_entries: usize,
    pub memory_hits: u64,
    pub memory_misses: u64,
    pub disk_hits: u64,
    pub disk_misses: u64,
    pub sets: u64,
    pub invalidations: u64,
    pub memory_hit_ratio: f64,
    pub disk_hit_ratio: f64,
    pub overall_hit_ratio: f64,
    pub eviction_strategy: EvictionStrategy,
}

impl EnhancedStats {
    /// Builds a report from the current counters.
    pub fn new(
        memory_entries: usize,
        disk_entries: usize,
        metrics: &CacheMetrics,
        eviction_strategy: EvictionStrategy,
    ) -> Self {
        Self {
            memory_entries,
            disk_entries,
            memory_hits: metrics.memory_hits,
            memory_misses: metrics.memory_misses,
            disk_hits: metrics.disk_hits,
            disk_misses: metrics.disk_misses,
            sets: metrics.sets,
            invalidations: metrics.invalidations,
            memory_hit_ratio: metrics.memory_hit_ratio(),
            disk_hit_ratio: metrics.disk_hit_ratio(),
            overall_hit_ratio: metrics.overall_hit_ratio(),
            eviction_strategy,
        }
    }
}
