//! Browsing operations over the serving root.
//!
//! Everything the HTTP layer does to the disk lives here, so the handlers
//! stay thin translation shims. Each operation takes paths that have
//! already been resolved by [`paths`] and reports failures as
//! [`BrowseError`], which the API layer maps onto status codes.
//!
//! # Architecture
//!
//! - [`paths`]: resolves client paths under the root and rejects escapes
//! - [`listing`]: one directory level, directory sizes from the cache
//! - [`search`]: recursive name-prefix scan over the whole root
//! - [`ops`]: upload, delete, and the download read, each mutation paired
//!   with a cache invalidation

pub mod listing;
pub mod ops;
pub mod paths;
pub mod search;

use std::io;
use std::path::PathBuf;

use serde::Serialize;

pub use listing::list_directory;
pub use ops::{open_download, remove_entry, save_file, SavedFile};
pub use paths::resolve_under_root;
pub use search::search;

/// A named entry with its effective size, as shown to clients.
///
/// Directories carry their full recursive size; files carry their own
/// length. Serializes in the wire spelling (`isDirectory`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInfo {
    /// Entry name; search results use the root-relative path instead
    pub name: String,
    /// Whether the entry is a directory
    pub is_directory: bool,
    /// Size in bytes
    pub size: u64,
}

/// Result alias for browsing operations.
pub type BrowseResult<T> = Result<T, BrowseError>;

/// Errors surfaced to the HTTP layer.
#[derive(thiserror::Error, Debug)]
pub enum BrowseError {
    /// The request path is malformed or would leave the serving root.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The specified path is not a regular file.
    #[error("Not a file: {0}")]
    NotAFile(PathBuf),

    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred underneath an operation.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl BrowseError {
    /// Classify an I/O error against the path it happened on.
    pub(crate) fn from_io(path: PathBuf, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Io { path, source: err },
        }
    }
}
