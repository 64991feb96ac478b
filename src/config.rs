//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from
//! environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::EvictionStrategy;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory backing the disk tier (created if absent)
    pub cache_dir: PathBuf,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Disk tier size budget in bytes
    pub max_size: u64,
    /// Memory tier entry-count budget
    pub memory_max_size: usize,
    /// Memory eviction strategy
    pub eviction_strategy: EvictionStrategy,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DIR` - Disk tier directory (default: `<tmp>/hybrid_cache`)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `MAX_SIZE` - Disk size budget in bytes (default: 10 MiB)
    /// - `MEMORY_MAX_SIZE` - Memory entry budget (default: 1024)
    /// - `EVICTION_STRATEGY` - `lru`, `lfu` or `ttl` (default: lru)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            default_ttl: env::var("DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl),
            max_size: env::var("MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_size),
            memory_max_size: env::var("MEMORY_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.memory_max_size),
            eviction_strategy: env::var("EVICTION_STRATEGY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.eviction_strategy),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: env::temp_dir().join("hybrid_cache"),
            default_ttl: 3600,
            max_size: 10 * 1024 * 1024,
            memory_max_size: 1024,
            eviction_strategy: EvictionStrategy::Lru,
            server_port: 3000,
        }
    }
}
