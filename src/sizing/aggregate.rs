//! Recursive directory-size aggregation with memoization.
//!
//! # Overview
//!
//! [`Aggregator`] answers two questions for the request handlers:
//!
//! 1. **How big is this directory?** [`Aggregator::directory_size`] walks
//!    the subtree, sums file sizes, and records a total for every directory
//!    it visits in the shared [`SizeCache`]. A later call for any directory
//!    that already has an entry returns it without touching its children.
//! 2. **This path changed, what now?** [`Aggregator::invalidate`] evicts the
//!    mutated directory and each ancestor up to the serving root, then
//!    recomputes the root once. The recomputation descends only along the
//!    evicted chain; every untouched sibling branch answers from cache.
//!
//! # Consistency
//!
//! The cache trades strictness for cheap reads. Two workers that miss the
//! same directory both walk it and both store a value; whichever write lands
//! last wins, and the values agree unless the tree mutated mid-walk.
//! Mutations that bypass the API are invisible until an invalidation covers
//! the affected path.
//!
//! # Example
//!
//! ```no_run
//! use dirserve::sizing::{Aggregator, SizeCache};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let cache = Arc::new(SizeCache::new());
//! let sizes = Aggregator::new(Path::new("/srv/files"), cache);
//!
//! let total = sizes.directory_size(Path::new("/srv/files/photos"));
//! println!("photos holds {total} bytes");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, warn};

use crate::sizing::cache::SizeCache;
use crate::sizing::file_size::{FileSizer, MetadataSizer};

/// Recursion ceiling shared by sizing and invalidation walks.
///
/// Trees deeper than this are almost always cycles that slipped past the
/// symlink check or pathological build output. Levels beyond the ceiling
/// count as empty rather than hanging a request worker.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Memoizing directory-size engine.
///
/// Holds the serving root, the shared cache, and the file-size reader. The
/// root must be an absolute, resolved path; the configuration layer
/// canonicalizes it once at startup. Handlers share one engine behind an
/// [`Arc`].
pub struct Aggregator {
    root: PathBuf,
    cache: Arc<SizeCache>,
    sizer: Arc<dyn FileSizer>,
    max_depth: usize,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("root", &self.root)
            .field("cache", &self.cache)
            .field("sizer", &"<sizer>")
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl Aggregator {
    /// Create an engine over `root` using the default metadata sizer.
    #[must_use]
    pub fn new(root: &Path, cache: Arc<SizeCache>) -> Self {
        Self {
            root: root.to_path_buf(),
            cache,
            sizer: Arc::new(MetadataSizer),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Replace the recursion ceiling.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replace the file-size reader.
    #[must_use]
    pub fn with_sizer(mut self, sizer: Arc<dyn FileSizer>) -> Self {
        self.sizer = sizer;
        self
    }

    /// The serving root this engine recomputes from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Handle to the shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<SizeCache> {
        &self.cache
    }

    /// Size of a single file through this engine's reader.
    #[must_use]
    pub fn file_size(&self, path: &Path) -> u64 {
        self.sizer.file_size(path)
    }

    /// Aggregate size of `dir` in bytes.
    ///
    /// Returns the cached total when one exists. On a miss the subtree is
    /// walked once, storing an entry for `dir` and every directory below it,
    /// so the next request for any of them is a lookup.
    ///
    /// Failure is absorbed, never surfaced: a missing path, a symlink, a
    /// subtree past the depth ceiling, or an unreadable directory all count
    /// as 0 bytes. Only the unreadable case caches that 0; the others stay
    /// out of the cache so a later call re-examines the path.
    pub fn directory_size(&self, dir: &Path) -> u64 {
        self.directory_size_at(dir, 0)
    }

    fn directory_size_at(&self, dir: &Path, depth: usize) -> u64 {
        if depth > self.max_depth {
            warn!(
                "Exceeded max depth {} at depth {} for directory {}",
                self.max_depth,
                depth,
                dir.display()
            );
            return 0;
        }

        let metadata = match fs::symlink_metadata(dir) {
            Ok(metadata) => metadata,
            Err(_) => {
                warn!("Directory does not exist: {}", dir.display());
                return 0;
            }
        };
        if !metadata.is_dir() && !metadata.file_type().is_symlink() {
            warn!("Not a directory: {}", dir.display());
            return 0;
        }

        if let Some(size) = self.cache.get(dir) {
            return size;
        }

        // Skip shortcuts/symlinks, and keep them out of the cache so an
        // entry for the link never shadows its target.
        if metadata.file_type().is_symlink() {
            return 0;
        }

        let mut total: u64 = 0;
        match fs::read_dir(dir) {
            Ok(entries) => {
                for entry in entries {
                    let entry = match entry {
                        Ok(entry) => entry,
                        Err(err) => {
                            warn!("Failed to read an entry of {}: {}", dir.display(), err);
                            continue;
                        }
                    };
                    let child = entry.path();
                    let file_type = match entry.file_type() {
                        Ok(file_type) => file_type,
                        Err(err) => {
                            warn!("Failed to read type of {}: {}", child.display(), err);
                            continue;
                        }
                    };
                    if file_type.is_dir()
                        || (file_type.is_symlink() && points_at_directory(&child))
                    {
                        total = total.saturating_add(self.directory_size_at(&child, depth + 1));
                    } else {
                        total = total.saturating_add(self.sizer.file_size(&child));
                    }
                }
            }
            Err(err) => {
                warn!("Failed to enumerate {}: {}", dir.display(), err);
            }
        }

        self.cache.put(dir.to_path_buf(), total)
    }

    /// Drop the cached totals from `dir` up to the root, then recompute.
    ///
    /// Call after any mutation beneath `dir`. Eviction runs from the mutated
    /// directory toward the root; once the root entry is gone the root is
    /// computed fresh, which re-fills one entry per evicted level while the
    /// rest of the tree answers from cache.
    ///
    /// A path outside the root walks to the top of the filesystem without
    /// meeting the root entry; the walk ends there with an error in the log
    /// and no recomputation.
    pub fn invalidate(&self, dir: &Path) {
        self.invalidate_at(dir, 0);
    }

    fn invalidate_at(&self, dir: &Path, depth: usize) {
        if depth > self.max_depth {
            warn!(
                "Exceeded max depth {} at depth {} while invalidating {}",
                self.max_depth,
                depth,
                dir.display()
            );
            return;
        }

        let parent = match dir.parent() {
            Some(parent) => parent,
            None => {
                error!("Directory has no parent: {}", dir.display());
                return;
            }
        };

        self.cache.remove(dir);

        if dir == self.root {
            self.directory_size(&self.root);
            return;
        }

        self.invalidate_at(parent, depth + 1);
    }
}

/// Whether a symlink resolves to a directory.
pub(crate) fn points_at_directory(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_dir()).unwrap_or(false)
}
