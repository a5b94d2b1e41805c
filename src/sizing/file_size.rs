//! Safe single-file size reads.
//!
//! The aggregation engine asks a [`FileSizer`] for the size of every regular
//! file it encounters. Reads never fail upward: a file that vanished or
//! cannot be statted counts as zero bytes, gets logged, and the walk moves
//! on. The trait seam also lets tests substitute a counting reader to
//! observe exactly which files an operation touched.

use std::fs;
use std::path::Path;

use log::warn;

/// Source of individual file sizes.
pub trait FileSizer: Send + Sync {
    /// Size of the file at `path` in bytes, or 0 if it cannot be determined.
    fn file_size(&self, path: &Path) -> u64;
}

/// Default sizer backed by [`fs::symlink_metadata`].
///
/// The no-follow variant is deliberate: a symlinked file contributes the
/// length of the link node itself, not its target, so one file never counts
/// toward several directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataSizer;

impl FileSizer for MetadataSizer {
    fn file_size(&self, path: &Path) -> u64 {
        match fs::symlink_metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                warn!("Failed to read size of {}: {}", path.display(), err);
                0
            }
        }
    }
}
