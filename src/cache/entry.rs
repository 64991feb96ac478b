//! Cache Entry Module
//!
//! Defines the memory-tier entry and the persisted disk record.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;

// == Memory-Tier Entry ==
/// A single memory-tier entry with access metadata.
///
/// `access_count` starts at 1 on every (re)insertion and grows on each hit.
/// `seq` is the insertion sequence number assigned by the tier; it is the
/// deterministic tie-break for LFU and TTL eviction.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Last access timestamp (Unix milliseconds)
    pub last_access: u64,
    /// Number of accesses since (re)insertion, including the insertion itself
    pub access_count: u64,
    /// Insertion sequence number (monotonic per tier)
    pub seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a fresh entry expiring `ttl` from now.
    pub fn new(value: V, ttl: Duration, seq: u64) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            created_at: now,
            expires_at: now + ttl.as_millis() as u64,
            last_access: now,
            access_count: 1,
            seq,
        }
    }

    // == Promotion Constructor ==
    /// Builds a memory-tier entry from a disk record, keeping the record's
    /// creation and expiry timestamps. Access metadata is reset as for any
    /// insertion.
    pub fn from_record(record: DiskRecord<V>, seq: u64) -> Self {
        Self {
            value: record.value,
            created_at: record.created_at,
            expires_at: record.expires_at,
            last_access: current_timestamp_ms(),
            access_count: 1,
            seq,
        }
    }

    // == Is Expired ==
    /// An entry is live while `expires_at >= now`; it is expired strictly
    /// after its expiry timestamp has passed.
    pub fn is_expired(&self) -> bool {
        self.expires_at < current_timestamp_ms()
    }

    // == Remaining TTL ==
    /// Milliseconds until expiry, 0 once expired.
    pub fn remaining_ttl_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }

    // == Touch ==
    /// Records a hit: refreshes `last_access` and bumps `access_count`.
    pub fn touch(&mut self) {
        self.last_access = current_timestamp_ms();
        self.access_count += 1;
    }
}

// == Disk Record ==
/// The persisted form of an entry: one JSON file per key.
///
/// Access metadata is memory-tier only and deliberately not persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct DiskRecord<V> {
    /// The stored value
    pub value: V,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl<V> DiskRecord<V> {
    /// Expiry check with the same boundary as the memory tier.
    pub fn is_expired(&self) -> bool {
        self.expires_at < current_timestamp_ms()
    }
}

// == Record Metadata View ==
/// Expiry-only view of a disk record, for stats and pruning where
/// deserializing the value would be wasted work.
#[derive(Debug, Deserialize)]
pub struct RecordMeta {
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl RecordMeta {
    pub fn is_expired(&self) -> bool {
        self.expires_at < current_timestamp_ms()
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
