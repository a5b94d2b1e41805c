use dirserve::browse::resolve_under_root;
use dirserve::sizing::{Aggregator, SizeCache};
use proptest::prelude::*;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Random file plans: up to three lowercase segments plus a size. Plans may
/// collide with each other (a file where a directory is needed); those are
/// skipped at build time, which is why assertions recount the actual disk
/// state instead of trusting the plan.
fn file_plans() -> impl Strategy<Value = Vec<(Vec<String>, usize)>> {
    prop::collection::vec(
        (prop::collection::vec("[a-z]{1,6}", 1..4), 0usize..2048),
        1..25,
    )
}

fn build_tree(root: &Path, plans: &[(Vec<String>, usize)]) -> Vec<PathBuf> {
    let mut written = Vec::new();
    for (segments, size) in plans {
        let mut path = root.to_path_buf();
        for segment in segments {
            path.push(segment);
        }
        if let Some(parent) = path.parent() {
            if fs::create_dir_all(parent).is_err() {
                continue;
            }
        }
        if fs::write(&path, vec![b'x'; *size]).is_ok() {
            written.push(path);
        }
    }
    written
}

fn recount(root: &Path) -> u64 {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok().map(|meta| meta.len()))
        .sum()
}

proptest! {
    #[test]
    fn test_cold_walk_matches_direct_recount(plans in file_plans()) {
        let dir = TempDir::new().unwrap();
        build_tree(dir.path(), &plans);

        let sizes = Aggregator::new(dir.path(), Arc::new(SizeCache::new()));
        prop_assert_eq!(sizes.directory_size(dir.path()), recount(dir.path()));
    }

    #[test]
    fn test_cached_answers_are_stable(plans in file_plans()) {
        let dir = TempDir::new().unwrap();
        build_tree(dir.path(), &plans);

        let sizes = Aggregator::new(dir.path(), Arc::new(SizeCache::new()));
        let first = sizes.directory_size(dir.path());
        for _ in 0..3 {
            prop_assert_eq!(sizes.directory_size(dir.path()), first);
        }
    }

    #[test]
    fn test_invalidation_converges_on_disk_truth(
        plans in file_plans(),
        rewrite in 0usize..4096,
    ) {
        let dir = TempDir::new().unwrap();
        let written = build_tree(dir.path(), &plans);
        prop_assume!(!written.is_empty());

        let sizes = Aggregator::new(dir.path(), Arc::new(SizeCache::new()));
        sizes.directory_size(dir.path());

        let target = &written[rewrite % written.len()];
        if target.is_file() {
            fs::write(target, vec![b'y'; rewrite]).unwrap();
        }
        if let Some(parent) = target.parent() {
            sizes.invalidate(parent);
        }

        // Invalidation recomputes the chain eagerly, so the cached root
        // total must already agree with a direct recount.
        prop_assert_eq!(sizes.cache().get(dir.path()), Some(recount(dir.path())));
    }

    #[test]
    fn test_resolved_requests_never_escape_the_root(request in "\\PC*") {
        let root = Path::new("/srv/shared");
        if let Ok(resolved) = resolve_under_root(root, &request) {
            prop_assert!(resolved.starts_with(root));
            prop_assert!(resolved
                .components()
                .all(|c| !matches!(c, Component::ParentDir)));
        }
    }

    #[test]
    fn test_requests_with_parent_components_are_rejected(
        prefix in "[a-z]{0,5}",
        suffix in "[a-z]{0,5}",
    ) {
        let root = Path::new("/srv/shared");
        let request = if prefix.is_empty() {
            format!("../{}", suffix)
        } else {
            format!("{}/../{}", prefix, suffix)
        };
        prop_assert!(resolve_under_root(root, &request).is_err());
    }
}
