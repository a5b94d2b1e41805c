//! Request-path resolution and containment.
//!
//! Every path a client sends is resolved lexically beneath the serving root
//! before any filesystem call happens. Resolution is lexical on purpose:
//! uploads name files that do not exist yet, so canonicalizing the target
//! is not an option. Instead each component is inspected and the request is
//! rejected outright when it is absolute, names a drive prefix, or steps
//! upward with `..`, and the assembled path is checked against the root one
//! last time before it is handed out.
//!
//! # Unicode
//!
//! Requests address entries by their exact on-disk bytes. Listings and
//! search hits report names as stored, so a returned name always resolves
//! back to the entry it was read from, even when the filesystem kept a
//! decomposed (NFD) spelling. Normalization happens only where names are
//! compared, in the search matcher.
//!
//! # Example
//!
//! ```
//! use dirserve::browse::paths::resolve_under_root;
//! use std::path::Path;
//!
//! let root = Path::new("/srv/files");
//! let ok = resolve_under_root(root, "docs/report.pdf").unwrap();
//! assert_eq!(ok, Path::new("/srv/files/docs/report.pdf"));
//!
//! assert!(resolve_under_root(root, "../etc/passwd").is_err());
//! ```

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use crate::browse::{BrowseError, BrowseResult};

/// On Windows, pushing a segment that carries a drive prefix without a root
/// (`C:` or `C:file`) replaces the entire `PathBuf`, and std parses
/// `Component::Prefix` only at the start of a string, so a mid-request `C:`
/// arrives here as a plain `Normal` component. The shape is rejected on
/// every platform so the same request fails the same way everywhere.
fn has_drive_letter_head(part: &OsStr) -> bool {
    let text = part.to_string_lossy();
    let bytes = text.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Resolve a client-supplied relative path against the serving root.
///
/// `.` components are dropped. Any component that could move the result
/// out from under `root` (`..`, a leading `/`, a drive prefix, or a
/// `C:`-shaped segment anywhere in the request) fails the whole request
/// rather than being stripped, so a crafted path never silently maps to a
/// different file. The assembled path is verified to still sit under
/// `root` before it is returned.
///
/// Request bytes are preserved as-is, so names taken from listings and
/// search results resolve back to the entries they were read from.
///
/// An empty request resolves to the root itself.
///
/// # Errors
///
/// Returns [`BrowseError::InvalidPath`] when the path cannot be contained.
pub fn resolve_under_root(root: &Path, request: &str) -> BrowseResult<PathBuf> {
    let mut resolved = root.to_path_buf();
    for component in Path::new(request).components() {
        match component {
            Component::Normal(part) => {
                if has_drive_letter_head(part) {
                    return Err(BrowseError::InvalidPath(request.to_string()));
                }
                resolved.push(part);
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(BrowseError::InvalidPath(request.to_string()));
            }
        }
    }
    if !is_within_root(root, &resolved) {
        return Err(BrowseError::InvalidPath(request.to_string()));
    }
    Ok(resolved)
}

/// Whether `path` sits at or below `root`, comparing components lexically.
///
/// Mutating operations re-check this on the final target even though the
/// path already came out of [`resolve_under_root`].
#[must_use]
pub fn is_within_root(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
}

/// Root-relative display form of `path`: '/'-separated with a leading '/'.
///
/// Search results and upload responses address entries this way regardless
/// of the platform separator. The root itself displays as `/`.
#[must_use]
pub fn display_relative(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut display = String::new();
    for component in relative.components() {
        display.push('/');
        display.push_str(&component.as_os_str().to_string_lossy());
    }
    if display.is_empty() {
        display.push('/');
    }
    display
}
