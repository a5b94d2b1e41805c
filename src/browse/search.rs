//! Recursive name search over the serving root.

use std::fs;
use std::path::Path;

use log::warn;
use unicode_normalization::UnicodeNormalization;
use walkdir::WalkDir;

use crate::browse::paths::display_relative;
use crate::browse::{BrowseError, BrowseResult, EntryInfo};
use crate::sizing::aggregate::points_at_directory;
use crate::sizing::Aggregator;

/// Fold a name for matching: NFC, then lowercase. Composed and decomposed
/// spellings of the same name produce the same key.
fn match_key(name: &str) -> String {
    name.nfc().collect::<String>().to_lowercase()
}

/// Find entries anywhere under `root` whose name starts with `query`.
///
/// Matching is case-insensitive on the NFC-normalized name. Hits come back
/// addressed by root-relative '/' path, directories before files, each
/// group sorted. Directory hits carry their recursive size, so a broad
/// query against a cold cache pays for the walks it triggers; repeated
/// queries answer from cache. Unreadable entries are logged and skipped.
///
/// The caller validates the query; an empty one matches everything.
///
/// # Errors
///
/// [`BrowseError::NotFound`] when `root` itself does not exist.
pub fn search(sizes: &Aggregator, root: &Path, query: &str) -> BrowseResult<Vec<EntryInfo>> {
    let metadata =
        fs::metadata(root).map_err(|err| BrowseError::from_io(root.to_path_buf(), err))?;
    if !metadata.is_dir() {
        return Err(BrowseError::NotADirectory(root.to_path_buf()));
    }

    let needle = match_key(query);
    let mut directories = Vec::new();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry during search: {}", err);
                continue;
            }
        };
        let name = match_key(&entry.file_name().to_string_lossy());
        if !name.starts_with(&needle) {
            continue;
        }

        let path = entry.path();
        let is_directory = entry.file_type().is_dir()
            || (entry.file_type().is_symlink() && points_at_directory(path));
        let size = if is_directory {
            sizes.directory_size(path)
        } else {
            sizes.file_size(path)
        };
        let hit = EntryInfo {
            name: display_relative(root, path),
            is_directory,
            size,
        };
        if is_directory {
            directories.push(hit);
        } else {
            files.push(hit);
        }
    }

    directories.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));
    directories.extend(files);
    Ok(directories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::SizeCache;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_file(path: &Path, bytes: usize) {
        let mut file = File::create(path).unwrap();
        file.write_all(&vec![0u8; bytes]).unwrap();
    }

    fn engine(root: &Path) -> Aggregator {
        Aggregator::new(root, Arc::new(SizeCache::new()))
    }

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("AlphaDir")).unwrap();
        write_file(&dir.path().join("AlphaDir/alpha.txt"), 20);
        write_file(&dir.path().join("AlphaDir/notes.md"), 5);
        write_file(&dir.path().join("beta.txt"), 10);
        dir
    }

    #[test]
    fn test_matches_name_prefixes_case_insensitively() {
        let dir = tree();
        let sizes = engine(dir.path());

        let hits = search(&sizes, dir.path(), "alp").unwrap();
        let names: Vec<&str> = hits.iter().map(|hit| hit.name.as_str()).collect();

        assert_eq!(names, vec!["/AlphaDir", "/AlphaDir/alpha.txt"]);
        assert!(hits[0].is_directory);
        assert_eq!(hits[0].size, 25);
        assert!(!hits[1].is_directory);
        assert_eq!(hits[1].size, 20);
    }

    #[test]
    fn test_matches_are_prefix_only() {
        let dir = tree();
        let sizes = engine(dir.path());

        // "lpha" appears inside both names but prefixes neither.
        assert!(search(&sizes, dir.path(), "lpha").unwrap().is_empty());
    }

    #[test]
    fn test_directories_sort_before_files() {
        let dir = TempDir::new().unwrap();
        write_file(&dir.path().join("match.txt"), 1);
        fs::create_dir(dir.path().join("match-dir")).unwrap();

        let sizes = engine(dir.path());
        let hits = search(&sizes, dir.path(), "match").unwrap();

        assert_eq!(hits.len(), 2);
        assert!(hits[0].is_directory);
        assert!(!hits[1].is_directory);
    }

    #[test]
    fn test_nfd_query_matches_nfc_names() {
        let dir = TempDir::new().unwrap();
        write_file(&dir.path().join("café.txt"), 4);

        let sizes = engine(dir.path());
        let hits = search(&sizes, dir.path(), "cafe\u{0301}").unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_hits_report_on_disk_spellings() {
        let dir = TempDir::new().unwrap();
        // Stored decomposed; a composed query must still find it, and the
        // hit must carry the stored bytes so it stays addressable.
        write_file(&dir.path().join("cafe\u{0301}.txt"), 4);

        let sizes = engine(dir.path());
        let hits = search(&sizes, dir.path(), "caf\u{e9}").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "/cafe\u{0301}.txt");
    }

    #[test]
    fn test_searching_a_missing_root_fails_with_not_found() {
        let dir = TempDir::new().unwrap();
        let sizes = engine(dir.path());

        let err = search(&sizes, &dir.path().join("ghost"), "x").unwrap_err();
        assert!(matches!(err, BrowseError::NotFound(_)));
    }
}
