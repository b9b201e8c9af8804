use std::fs;

use repotidy_core::Category;
use repotidy_scan::{Classifier, RuleSet, ScanConfig, TreeWalker};
use tempfile::TempDir;

fn example_repo() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fs::create_dir_all(root.join("docs")).unwrap();
    fs::create_dir_all(root.join("packages/widget/docs")).unwrap();
    fs::create_dir_all(root.join(".repotidy/archive")).unwrap();
    fs::create_dir_all(root.join(".github/workflows")).unwrap();

    fs::write(root.join("docs/setup.md"), "# Setup\n\nRun the installer.\n").unwrap();
    fs::write(
        root.join("packages/widget/docs/setup.md"),
        "# Setup\n\nRun the installer.\n",
    )
    .unwrap();
    fs::write(
        root.join("packages/widget/Button.tsx"),
        "export const Widget = () => null;\n",
    )
    .unwrap();
    fs::write(root.join("debug.log"), "trace output\n").unwrap();
    fs::write(root.join(".github/workflows/ci.yml"), "on: push\n").unwrap();
    fs::write(root.join(".repotidy/archive/old.md"), "archived\n").unwrap();

    temp
}

#[test]
fn test_scan_classifies_every_file_once() {
    let temp = example_repo();
    let classifier = Classifier::new(RuleSet::default()).unwrap();
    let files = TreeWalker::new()
        .scan(&ScanConfig::new(temp.path()), &classifier)
        .unwrap();

    // The state directory is excluded by default.
    assert!(files.get(".repotidy/archive/old.md").is_none());
    assert_eq!(files.len(), 5);

    assert_eq!(files.get("debug.log").unwrap().category, Category::Temp);
    assert_eq!(files.get("docs/setup.md").unwrap().category, Category::Docs);
    assert_eq!(
        files.get("packages/widget/Button.tsx").unwrap().category,
        Category::Source
    );
    assert_eq!(
        files.get(".github/workflows/ci.yml").unwrap().category,
        Category::Protected
    );
}

#[test]
fn test_identical_content_shares_hash_and_size() {
    let temp = example_repo();
    let classifier = Classifier::new(RuleSet::default()).unwrap();
    let files = TreeWalker::new()
        .scan(&ScanConfig::new(temp.path()), &classifier)
        .unwrap();

    let a = files.get("docs/setup.md").unwrap();
    let b = files.get("packages/widget/docs/setup.md").unwrap();
    assert_eq!(a.content_hash, b.content_hash);
    assert_eq!(a.size, b.size);
    assert_ne!(
        a.content_hash,
        files.get("debug.log").unwrap().content_hash
    );
}

#[test]
fn test_scan_root_is_canonical() {
    let temp = example_repo();
    let classifier = Classifier::new(RuleSet::default()).unwrap();
    let dotted = temp.path().join("docs").join("..");
    let files = TreeWalker::new()
        .scan(&ScanConfig::new(&dotted), &classifier)
        .unwrap();

    assert_eq!(files.root, temp.path().canonicalize().unwrap());
    assert!(files.get("docs/setup.md").is_some());
}
