//! Eviction Strategy Module
//!
//! Names the rule used to pick a memory-tier victim when the tier is full.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

// == Eviction Strategy ==
/// Memory-tier eviction policy. Fixed per insertion cycle but switchable at
/// runtime between operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Evict the least recently used entry
    Lru,
    /// Evict the least frequently used entry
    Lfu,
    /// Evict the entry closest to expiry, falling back to LRU
    Ttl,
}

impl EvictionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionStrategy::Lru => "lru",
            EvictionStrategy::Lfu => "lfu",
            EvictionStrategy::Ttl => "ttl",
        }
    }
}

impl Default for EvictionStrategy {
    fn default() -> Self {
        EvictionStrategy::Lru
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionStrategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionStrategy::Lru),
            "lfu" => Ok(EvictionStrategy::Lfu),
            "ttl" => Ok(EvictionStrategy::Ttl),
            other => Err(CacheError::InvalidRequest(format!(
                "Unknown eviction strategy: {}",
                other
            ))),
        }
    }
}
