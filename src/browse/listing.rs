//! Single-level directory listings.

use std::fs;
use std::path::Path;

use log::warn;

use crate::browse::{BrowseError, BrowseResult, EntryInfo};
use crate::sizing::aggregate::points_at_directory;
use crate::sizing::Aggregator;

/// List the immediate children of `dir`.
///
/// Directories come first, each carrying its full recursive size from the
/// aggregation engine; files follow with their individual lengths. Both
/// groups are name-sorted so listings stay stable between requests. A
/// symlink that resolves to a directory is listed as one (its size shows
/// as 0, the same rule the aggregation applies).
///
/// # Errors
///
/// [`BrowseError::NotFound`] when `dir` is missing,
/// [`BrowseError::NotADirectory`] when it is something else, and
/// [`BrowseError::PermissionDenied`] / [`BrowseError::Io`] when
/// enumeration fails.
pub fn list_directory(sizes: &Aggregator, dir: &Path) -> BrowseResult<Vec<EntryInfo>> {
    let metadata =
        fs::metadata(dir).map_err(|err| BrowseError::from_io(dir.to_path_buf(), err))?;
    if !metadata.is_dir() {
        return Err(BrowseError::NotADirectory(dir.to_path_buf()));
    }

    let mut directories = Vec::new();
    let mut files = Vec::new();

    let entries = fs::read_dir(dir).map_err(|err| BrowseError::from_io(dir.to_path_buf(), err))?;
    for entry in entries {
        let entry = entry.map_err(|err| BrowseError::from_io(dir.to_path_buf(), err))?;
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(err) => {
                warn!("Failed to read type of {}: {}", path.display(), err);
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();

        if file_type.is_dir() || (file_type.is_symlink() && points_at_directory(&path)) {
            directories.push(EntryInfo {
                name,
                is_directory: true,
                size: sizes.directory_size(&path),
            });
        } else {
            files.push(EntryInfo {
                name,
                is_directory: false,
                size: sizes.file_size(&path),
            });
        }
    }

    directories.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));
    directories.extend(files);
    Ok(directories)
}
