use dirserve::browse::paths::resolve_under_root;
use dirserve::browse::{
    list_directory, open_download, remove_entry, save_file, search, BrowseError,
};
use dirserve::sizing::{Aggregator, SizeCache};
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn aggregator(root: &Path) -> Aggregator {
    Aggregator::new(root, Arc::new(SizeCache::new()))
}

#[test]
fn test_saved_file_appears_in_listing_and_search() {
    let dir = tempdir().unwrap();
    let sizes = aggregator(dir.path());

    let destination = resolve_under_root(dir.path(), "inbox/todo.txt").unwrap();
    let saved = save_file(&sizes, &destination, b"buy milk").unwrap();
    assert_eq!(saved.name, "todo.txt");
    assert_eq!(saved.path, "/inbox/todo.txt");
    assert_eq!(saved.size, 8);

    let inbox = list_directory(&sizes, &dir.path().join("inbox")).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].name, "todo.txt");
    assert_eq!(inbox[0].size, 8);

    let hits = search(&sizes, dir.path(), "todo").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "/inbox/todo.txt");
}

#[test]
fn test_save_then_download_round_trip() {
    let dir = tempdir().unwrap();
    let sizes = aggregator(dir.path());

    let destination = resolve_under_root(dir.path(), "docs/plan v2.pdf").unwrap();
    save_file(&sizes, &destination, b"pdf bytes").unwrap();

    let (mut file, length) = open_download(&destination).unwrap();
    assert_eq!(length, 9);

    let mut body = Vec::new();
    file.read_to_end(&mut body).unwrap();
    assert_eq!(body, b"pdf bytes");
}

#[test]
fn test_listed_names_stay_addressable_for_decomposed_unicode() {
    let dir = tempdir().unwrap();
    // Stored in decomposed form, as a macOS client would create it.
    fs::write(dir.path().join("cafe\u{0301}.txt"), b"beans").unwrap();

    let sizes = aggregator(dir.path());
    let entries = list_directory(&sizes, dir.path()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "cafe\u{0301}.txt");

    // The listed name resolves back to the entry it came from.
    let target = resolve_under_root(dir.path(), &entries[0].name).unwrap();
    let (mut file, length) = open_download(&target).unwrap();
    assert_eq!(length, 5);
    let mut body = Vec::new();
    file.read_to_end(&mut body).unwrap();
    assert_eq!(body, b"beans");

    remove_entry(&sizes, &target).unwrap();
    assert!(!target.exists());
}

#[test]
fn test_save_keeps_cached_totals_current() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("seed.txt"), b"12345").unwrap();

    let sizes = aggregator(dir.path());
    assert_eq!(sizes.directory_size(dir.path()), 5);

    let destination = resolve_under_root(dir.path(), "uploads/blob.bin").unwrap();
    save_file(&sizes, &destination, &[0u8; 100]).unwrap();

    // save_file invalidated the parent chain, so the root total is already fresh.
    assert_eq!(sizes.cache().get(dir.path()), Some(105));

    // Overwriting shrinks the file and the totals follow.
    save_file(&sizes, &destination, &[0u8; 10]).unwrap();
    assert_eq!(sizes.cache().get(dir.path()), Some(15));
    assert_eq!(sizes.cache().get(&dir.path().join("uploads")), Some(10));
}

#[test]
fn test_remove_file_refreshes_sizes_and_listing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("keep.txt"), b"aaaa").unwrap();
    fs::write(dir.path().join("drop.txt"), b"bbbbbb").unwrap();

    let sizes = aggregator(dir.path());
    assert_eq!(sizes.directory_size(dir.path()), 10);

    remove_entry(&sizes, &dir.path().join("drop.txt")).unwrap();

    assert_eq!(sizes.cache().get(dir.path()), Some(4));
    let entries = list_directory(&sizes, dir.path()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "keep.txt");
}

#[test]
fn test_remove_directory_drops_whole_subtree() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("cache/images")).unwrap();
    fs::write(dir.path().join("cache/images/a.png"), b"123").unwrap();
    fs::write(dir.path().join("cache/meta.json"), b"{}").unwrap();
    fs::write(dir.path().join("data.db"), b"xxxxxxx").unwrap();

    let sizes = aggregator(dir.path());
    assert_eq!(sizes.directory_size(dir.path()), 12);

    remove_entry(&sizes, &dir.path().join("cache")).unwrap();

    assert!(!dir.path().join("cache").exists());
    assert_eq!(sizes.cache().get(dir.path()), Some(7));
}

#[test]
fn test_traversal_requests_never_resolve() {
    let dir = tempdir().unwrap();

    let err = resolve_under_root(dir.path(), "../outside.txt").unwrap_err();
    assert!(matches!(err, BrowseError::InvalidPath(_)));

    let err = resolve_under_root(dir.path(), "nested/../../outside.txt").unwrap_err();
    assert!(matches!(err, BrowseError::InvalidPath(_)));

    let err = resolve_under_root(dir.path(), "/etc/passwd").unwrap_err();
    assert!(matches!(err, BrowseError::InvalidPath(_)));

    let err = resolve_under_root(dir.path(), "logs/C:/secret.txt").unwrap_err();
    assert!(matches!(err, BrowseError::InvalidPath(_)));
}

#[test]
fn test_save_refuses_paths_outside_root() {
    let outer = tempdir().unwrap();
    let root = outer.path().join("root");
    fs::create_dir(&root).unwrap();

    let sizes = aggregator(&root);
    let escape = outer.path().join("escapee.txt");

    let err = save_file(&sizes, &escape, b"nope").unwrap_err();
    assert!(matches!(err, BrowseError::InvalidPath(_)));
    assert!(!escape.exists());
}

#[test]
fn test_removing_the_root_is_rejected() {
    let dir = tempdir().unwrap();
    let sizes = aggregator(dir.path());

    let err = remove_entry(&sizes, dir.path()).unwrap_err();
    assert!(matches!(err, BrowseError::InvalidPath(_)));
    assert!(dir.path().exists());
}

#[test]
fn test_download_of_directory_is_rejected() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("folder")).unwrap();

    let err = open_download(&dir.path().join("folder")).unwrap_err();
    assert!(matches!(err, BrowseError::NotAFile(_)));
}

#[test]
fn test_download_of_missing_file_is_not_found() {
    let dir = tempdir().unwrap();

    let err = open_download(&dir.path().join("absent.bin")).unwrap_err();
    assert!(matches!(err, BrowseError::NotFound(_)));
}
