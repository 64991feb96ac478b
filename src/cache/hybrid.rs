//! Hybrid Cache Module
//!
//! Two-tier cache engine: a bounded memory tier over a persistent disk
//! store. Reads promote disk hits into memory; writes go through to both
//! tiers. One instance-wide mutex guards the composite state (memory tier,
//! metric counters, active strategy) for the full duration of every
//! operation; reads mutate ordering and frequency metadata, so they take
//! the same lock as writes. Disk I/O performed during promotion happens
//! under the lock; it is local and small, and the resulting serialization
//! of concurrent gets is a known scalability trade, not a correctness
//! issue.
//!
//! There are no background threads or timers: expiry is discovered lazily
//! by the access that observes it, and disk pruning runs before writes.

use std::path::PathBuf;
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::memory::MemoryTier;
use crate::cache::stats::{CacheMetrics, DiskStats, EnhancedStats};
use crate::cache::{DiskStore, EvictionStrategy};
use crate::error::Result;

// == Guarded State ==
/// Everything the instance mutex protects.
#[derive(Debug)]
struct HybridState<V> {
    memory: MemoryTier<V>,
    metrics: CacheMetrics,
    strategy: EvictionStrategy,
}

// == Hybrid Cache ==
/// Thread-safe two-tier cache. All methods take `&self`; the instance can
/// be shared behind an `Arc` without external locking.
#[derive(Debug)]
pub struct HybridCache<V> {
    disk: DiskStore<V>,
    state: Mutex<HybridState<V>>,
    default_ttl: Duration,
}

impl<V> HybridCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Creates a hybrid cache rooted at `cache_dir` (created if absent).
    ///
    /// # Arguments
    /// * `cache_dir` - Directory backing the disk tier
    /// * `default_ttl` - TTL applied when a `set` does not specify one
    /// * `max_size` - Disk tier size budget in bytes
    /// * `memory_max_size` - Memory tier entry-count budget
    /// * `eviction_strategy` - Initial memory eviction strategy
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        default_ttl: Duration,
        max_size: u64,
        memory_max_size: usize,
        eviction_strategy: EvictionStrategy,
    ) -> Result<Self> {
        let disk = DiskStore::new(cache_dir, default_ttl, max_size)?;
        Ok(Self {
            disk,
            state: Mutex::new(HybridState {
                memory: MemoryTier::new(memory_max_size),
                metrics: CacheMetrics::new(),
                strategy: eviction_strategy,
            }),
            default_ttl,
        })
    }

    // == Get ==
    /// Retrieves a live value, trying memory first and falling through to
    /// disk. A memory hit records the access (reads are not side-effect
    /// free); a disk hit is promoted into the memory tier through the
    /// regular insertion path, evicting if the tier is full.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock();
        let strategy = state.strategy;

        if let Some(value) = state.memory.lookup(key, strategy) {
            state.metrics.memory_hits += 1;
            return Some(value);
        }
        state.metrics.memory_misses += 1;

        match self.disk.get_record(key) {
            Some(record) => {
                state.metrics.disk_hits += 1;
                let value = record.value.clone();
                if let Some(victim) = state.memory.insert_promoted(key.to_string(), record, strategy)
                {
                    debug!("Promotion of '{}' evicted '{}' from memory", key, victim);
                }
                Some(value)
            }
            None => {
                state.metrics.disk_misses += 1;
                None
            }
        }
    }

    // == Set ==
    /// Stores a value in both tiers with the given TTL (instance default
    /// when `None`). The memory insert is authoritative: a disk write-through
    /// failure is logged by the disk store and swallowed here, so the
    /// operation still reports success.
    pub fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> bool {
        let ttl = ttl.unwrap_or(self.default_ttl);
        let mut state = self.state.lock();
        state.metrics.sets += 1;

        let strategy = state.strategy;
        if let Some(victim) =
            state
                .memory
                .insert_fresh(key.to_string(), value.clone(), ttl, strategy)
        {
            debug!("Insert of '{}' evicted '{}' from memory", key, victim);
        }

        self.disk.set(key, &value, Some(ttl));
        true
    }

    // == Invalidate ==
    /// Removes `key` from both tiers. Returns true if it was present in at
    /// least one.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut state = self.state.lock();
        state.metrics.invalidations += 1;

        let memory_removed = state.memory.remove(key);
        let disk_removed = self.disk.invalidate(key);
        memory_removed || disk_removed
    }

    // == Invalidate Pattern ==
    /// Removes every key matching `pattern` from both tiers and returns the
    /// number removed. Only keys currently resident in the memory tier are
    /// matched; a key living only on disk is not found (no on-disk key index
    /// is maintained). A malformed pattern is a caller error and returns
    /// `CacheError::InvalidPattern` immediately.
    pub fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)?;

        let mut state = self.state.lock();
        let matches: Vec<String> = state
            .memory
            .keys()
            .filter(|key| regex.is_match(key))
            .cloned()
            .collect();

        for key in &matches {
            state.memory.remove(key);
            self.disk.invalidate(key);
        }
        state.metrics.invalidations += matches.len() as u64;

        Ok(matches.len())
    }

    // == Demote ==
    /// Drops the memory-tier copy of `key`, leaving any disk entry intact
    /// and re-promotable by the next `get`. Returns true if a memory copy
    /// existed.
    pub fn demote(&self, key: &str) -> bool {
        self.state.lock().memory.remove(key)
    }

    // == Clear ==
    /// Empties the memory tier (including its frequency counters) and then
    /// the disk store. Metric counters survive; they reset only with
    /// instance recreation.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.memory.clear();
        self.disk.clear();
    }

    // == Strategy ==
    /// The active eviction strategy.
    pub fn eviction_strategy(&self) -> EvictionStrategy {
        self.state.lock().strategy
    }

    /// Switches the eviction strategy for subsequent operations.
    pub fn set_eviction_strategy(&self, strategy: EvictionStrategy) {
        self.state.lock().strategy = strategy;
    }

    // == Stats ==
    /// Disk-tier directory snapshot.
    pub fn stats(&self) -> DiskStats {
        self.disk.stats()
    }

    /// Entry counts for both tiers, the six counters, derived hit ratios
    /// and the active strategy.
    pub fn enhanced_stats(&self) -> EnhancedStats {
        let disk_entries = self.disk.stats().active_entries;
        let state = self.state.lock();
        EnhancedStats::new(
            state.memory.len(),
            disk_entries,
            &state.metrics,
            state.strategy,
        )
    }

    /// Number of entries currently resident in the memory tier.
    pub fn memory_entries(&self) -> usize {
        self.state.lock().memory.len()
    }

    /// Whether `key` currently has a memory-tier copy.
    pub fn memory_contains(&self, key: &str) -> bool {
        self.state.lock().memory.contains(key)
    }

    /// The TTL used when `set` is called without one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
