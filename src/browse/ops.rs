//! Mutating operations and the download read.
//!
//! Uploads and deletes are the only two ways the API changes the disk, and
//! each one ends by invalidating the cached sizes of the directory it
//! touched. Keeping mutation and invalidation in the same function is what
//! makes the cache trustworthy: a handler cannot forget the second half.

use std::fs;
use std::path::Path;

use bytesize::ByteSize;
use log::info;
use serde::Serialize;

use crate::browse::paths::{display_relative, is_within_root};
use crate::browse::{BrowseError, BrowseResult};
use crate::sizing::Aggregator;

/// Outcome of a successful upload, in its wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFile {
    /// Final file name on disk
    pub name: String,
    /// Root-relative '/' path of the stored file
    pub path: String,
    /// Bytes written
    pub size: u64,
}

/// Write `body` to `destination`, creating missing parent directories.
///
/// Overwriting an existing file is allowed; overwriting a directory is
/// not. The destination comes out of the path resolver already, but its
/// containment is re-checked here before anything touches the disk.
///
/// On success the parent directory's cached sizes are invalidated.
///
/// # Errors
///
/// [`BrowseError::InvalidPath`] for targets outside the root,
/// [`BrowseError::NotAFile`] when the destination is a directory, and the
/// I/O classifications for filesystem failures.
pub fn save_file(sizes: &Aggregator, destination: &Path, body: &[u8]) -> BrowseResult<SavedFile> {
    if !is_within_root(sizes.root(), destination) {
        return Err(BrowseError::InvalidPath(
            destination.display().to_string(),
        ));
    }
    if fs::symlink_metadata(destination).is_ok_and(|meta| meta.is_dir()) {
        return Err(BrowseError::NotAFile(destination.to_path_buf()));
    }
    let name = match destination.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => {
            return Err(BrowseError::InvalidPath(
                destination.display().to_string(),
            ))
        }
    };
    let parent = match destination.parent() {
        Some(parent) => parent.to_path_buf(),
        None => {
            return Err(BrowseError::InvalidPath(
                destination.display().to_string(),
            ))
        }
    };

    fs::create_dir_all(&parent).map_err(|err| BrowseError::from_io(parent.clone(), err))?;
    fs::write(destination, body)
        .map_err(|err| BrowseError::from_io(destination.to_path_buf(), err))?;

    let size = body.len() as u64;
    info!("Stored {} ({})", destination.display(), ByteSize::b(size));
    sizes.invalidate(&parent);

    Ok(SavedFile {
        name,
        path: display_relative(sizes.root(), destination),
        size,
    })
}

/// Remove the file or directory at `target`.
///
/// Directories are removed with their contents. The serving root itself is
/// never removable. On success the parent's cached sizes are invalidated;
/// entries for directories below a removed tree are left behind, and the
/// eviction on any path that recreates them clears them before reuse.
///
/// # Errors
///
/// [`BrowseError::NotFound`] when `target` does not exist, plus the usual
/// containment and I/O classifications.
pub fn remove_entry(sizes: &Aggregator, target: &Path) -> BrowseResult<()> {
    if !is_within_root(sizes.root(), target) {
        return Err(BrowseError::InvalidPath(target.display().to_string()));
    }
    if target == sizes.root() {
        return Err(BrowseError::InvalidPath(target.display().to_string()));
    }

    let metadata = fs::symlink_metadata(target)
        .map_err(|err| BrowseError::from_io(target.to_path_buf(), err))?;
    if metadata.is_dir() {
        fs::remove_dir_all(target)
            .map_err(|err| BrowseError::from_io(target.to_path_buf(), err))?;
        info!("Deleted directory {}", target.display());
    } else {
        fs::remove_file(target).map_err(|err| BrowseError::from_io(target.to_path_buf(), err))?;
        info!("Deleted file {}", target.display());
    }

    if let Some(parent) = target.parent() {
        sizes.invalidate(parent);
    }
    Ok(())
}

/// Open `target` for download, returning the file and its length.
///
/// Symlinks are followed here; the client asked for content, not for link
/// metadata.
///
/// # Errors
///
/// [`BrowseError::NotFound`] when `target` does not exist and
/// [`BrowseError::NotAFile`] when it is not a regular file.
pub fn open_download(target: &Path) -> BrowseResult<(fs::File, u64)> {
    let metadata =
        fs::metadata(target).map_err(|err| BrowseError::from_io(target.to_path_buf(), err))?;
    if !metadata.is_file() {
        return Err(BrowseError::NotAFile(target.to_path_buf()));
    }
    let file =
        fs::File::open(target).map_err(|err| BrowseError::from_io(target.to_path_buf(), err))?;
    Ok((file, metadata.len()))
}
