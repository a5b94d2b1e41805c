//! Concurrent directory-size cache.
//!
//! Maps resolved directory paths to their aggregate size in bytes. The map
//! is sharded ([`DashMap`]), so request workers read and write entries
//! without funneling through a single lock.
//!
//! Entries carry no timestamps and never expire on their own. Staleness is
//! handled by [`Aggregator::invalidate`](crate::sizing::Aggregator::invalidate),
//! which evicts the mutated directory and everything above it.

use std::path::{Path, PathBuf};

use dashmap::DashMap;

/// Shared path -> aggregate-bytes map.
///
/// Keys are absolute, resolved directory paths. Values are the summed size
/// of every regular file reachable beneath the key at the time the entry
/// was computed.
#[derive(Debug, Default)]
pub struct SizeCache {
    entries: DashMap<PathBuf, u64>,
}

impl SizeCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up the cached size for `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<u64> {
        self.entries.get(path).map(|entry| *entry)
    }

    /// Insert or replace the entry for `path`, returning the stored size.
    pub fn put(&self, path: PathBuf, size: u64) -> u64 {
        self.entries.insert(path, size);
        size
    }

    /// Evict `path`, returning the evicted size if one was present.
    pub fn remove(&self, path: &Path) -> Option<u64> {
        self.entries.remove(path).map(|(_, size)| size)
    }

    /// Number of cached directories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
