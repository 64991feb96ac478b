//! Disk Store Module
//!
//! Persistent key/value tier: one JSON file per key under the cache
//! directory, named by the SHA-256 digest of the key. Writes go to a
//! temporary file in the same directory and are renamed into place, so a
//! reader never observes a partially-written entry. Storage faults degrade
//! to a miss (`get`) or a `false` return (`set`) and are logged at warning
//! level; the store never lets an I/O problem escape to the caller.

use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::cache::entry::{current_timestamp_ms, DiskRecord, RecordMeta};
use crate::cache::stats::DiskStats;
use crate::error::Result;

// == Constants ==
/// Fraction of `max_size` pruning shrinks the directory to once the limit
/// is exceeded. The gap keeps writes near the limit from pruning every time.
pub const PRUNE_TARGET_RATIO: f64 = 0.8;

/// Extension of entry files; anything else in the directory is ignored by
/// pruning and stats.
const ENTRY_EXT: &str = "json";

// == Serialized Forms ==
/// Borrowed write-side view of a disk record.
#[derive(Serialize)]
struct RecordOut<'a, V> {
    value: &'a V,
    created_at: u64,
    expires_at: u64,
}

// == Disk Store ==
/// File-backed cache tier with lazy expiry and size-bounded pruning.
#[derive(Debug)]
pub struct DiskStore<V> {
    /// Directory holding one file per entry
    cache_dir: PathBuf,
    /// TTL applied when a `set` does not specify one
    default_ttl: Duration,
    /// Directory size budget in bytes
    max_size: u64,
    _value: PhantomData<fn() -> V>,
}

impl<V> DiskStore<V> {
    // == Constructor ==
    /// Creates a store rooted at `cache_dir`, creating the directory if it
    /// does not exist.
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        default_ttl: Duration,
        max_size: u64,
    ) -> Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            default_ttl,
            max_size,
            _value: PhantomData,
        })
    }

    /// The store's directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// The TTL used when `set` is called without one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Entry Path ==
    /// Deterministic file path for a key: SHA-256 hex digest of the key
    /// bytes, so any key maps to a valid file name.
    fn entry_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        self.cache_dir.join(format!("{}.{}", digest, ENTRY_EXT))
    }

    // == Invalidate ==
    /// Removes the entry file for `key`. Returns true if a file was removed.
    pub fn invalidate(&self, key: &str) -> bool {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(err) if err.kind() == io::ErrorKind::NotFound => false,
            Err(err) => {
                warn!("Failed to remove cache entry for key '{}': {}", key, err);
                false
            }
        }
    }

    // == Clear ==
    /// Removes every file in the cache directory, best-effort per file.
    pub fn clear(&self) {
        let dir = match fs::read_dir(&self.cache_dir) {
            Ok(dir) => dir,
            Err(err) => {
                warn!(
                    "Failed to list cache directory {}: {}",
                    self.cache_dir.display(),
                    err
                );
                return;
            }
        };

        for entry in dir.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Err(err) = fs::remove_file(&path) {
                warn!("Failed to remove cache file {}: {}", path.display(), err);
            }
        }
    }

    // == Prune ==
    /// Shrinks the directory below the size budget, oldest-accessed files
    /// first, down to `PRUNE_TARGET_RATIO * max_size`. Invoked before every
    /// write; a no-op while the directory is within budget.
    pub fn prune(&self) {
        let mut files = self.scan_entries();
        let mut total: u64 = files.iter().map(|(_, size, _)| *size).sum();
        if total <= self.max_size {
            return;
        }

        let target = (self.max_size as f64 * PRUNE_TARGET_RATIO) as u64;
        files.sort_by_key(|(_, _, last_access)| *last_access);

        let mut removed = 0usize;
        for (path, size, _) in files {
            if total <= target {
                break;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    total = total.saturating_sub(size);
                    removed += 1;
                }
                Err(err) => {
                    warn!("Failed to prune cache file {}: {}", path.display(), err);
                }
            }
        }

        if removed > 0 {
            debug!(
                "Pruned {} cache files, directory now holds {} bytes",
                removed, total
            );
        }
    }

    // == Stats ==
    /// Snapshot of the directory: entry counts, live/expired split and
    /// total size. Unreadable files count as expired.
    pub fn stats(&self) -> DiskStats {
        let files = self.scan_entries();
        let mut active = 0usize;
        let mut total_size = 0u64;

        for (path, size, _) in &files {
            total_size += size;
            let live = fs::read(path)
                .ok()
                .and_then(|bytes| serde_json::from_slice::<RecordMeta>(&bytes).ok())
                .map(|meta| !meta.is_expired())
                .unwrap_or(false);
            if live {
                active += 1;
            }
        }

        DiskStats {
            total_entries: files.len(),
            active_entries: active,
            expired_entries: files.len() - active,
            total_size_bytes: total_size,
            cache_dir: self.cache_dir.clone(),
        }
    }

    // == Scan ==
    /// Lists entry files with their size and last-access time (modified
    /// time where access time is unavailable).
    fn scan_entries(&self) -> Vec<(PathBuf, u64, SystemTime)> {
        let mut files = Vec::new();
        let dir = match fs::read_dir(&self.cache_dir) {
            Ok(dir) => dir,
            Err(_) => return files,
        };

        for entry in dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXT) {
                continue;
            }
            let meta = match entry.metadata() {
                Ok(meta) if meta.is_file() => meta,
                _ => continue,
            };
            let last_access = meta
                .accessed()
                .or_else(|_| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((path, meta.len(), last_access));
        }
        files
    }
}

impl<V: Serialize + DeserializeOwned> DiskStore<V> {
    // == Get ==
    /// Retrieves the value for `key`, or `None` when the entry is absent,
    /// expired (the file is deleted on discovery) or unreadable.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_record(key).map(|record| record.value)
    }

    /// Like [`get`](Self::get), but returns the whole record so a caller can
    /// carry the original timestamps forward (memory-tier promotion).
    pub fn get_record(&self, key: &str) -> Option<DiskRecord<V>> {
        let path = self.entry_path(key);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!("Failed to read cache entry for key '{}': {}", key, err);
                return None;
            }
        };

        let record: DiskRecord<V> = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(err) => {
                warn!("Ignoring unreadable cache entry for key '{}': {}", key, err);
                return None;
            }
        };

        if record.is_expired() {
            let _ = fs::remove_file(&path);
            return None;
        }

        Some(record)
    }

    // == Set ==
    /// Stores `value` under `key` with the given TTL (the store default when
    /// `None`). Prunes opportunistically first. Returns false on any storage
    /// fault; the fault is logged and the temp file cleaned up.
    pub fn set(&self, key: &str, value: &V, ttl: Option<Duration>) -> bool {
        self.prune();

        let ttl = ttl.unwrap_or(self.default_ttl);
        let path = self.entry_path(key);
        let temp = path.with_extension("json.tmp");

        match self.write_record(&path, &temp, value, ttl) {
            Ok(()) => true,
            Err(err) => {
                if temp.exists() {
                    let _ = fs::remove_file(&temp);
                }
                warn!("Failed to write cache entry for key '{}': {}", key, err);
                false
            }
        }
    }

    fn write_record(&self, path: &Path, temp: &Path, value: &V, ttl: Duration) -> Result<()> {
        let now = current_timestamp_ms();
        let record = RecordOut {
            value,
            created_at: now,
            expires_at: now + ttl.as_millis() as u64,
        };
        let bytes = serde_json::to_vec(&record)?;
        fs::write(temp, bytes)?;
        fs::rename(temp, path)?;
        Ok(())
    }
}
