use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn repotidy(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_repotidy"))
        .args(args)
        .current_dir(dir)
        .env_remove("REPOTIDY_LOG")
        .output()
        .unwrap()
}

fn write(root: &Path, path: &str, contents: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, contents).unwrap();
}

fn example_repo() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(root, "docs/setup.md", "# Setup\n\nRun the installer.\n");
    write(root, "packages/widget/docs/setup.md", "# Setup\n\nRun the installer.\n");
    write(root, "packages/widget/Button.tsx", "export const Widget = () => null;\n");
    write(root, "debug.log", "trace output\n");
    temp
}

#[test]
fn test_plan_apply_verify() {
    let temp = example_repo();
    let root = temp.path();

    let plan = repotidy(&["plan", "--quiet"], root);
    assert!(plan.status.success(), "{}", String::from_utf8_lossy(&plan.stderr));
    assert!(root.join(".repotidy/plan.json").is_file());
    let report = fs::read_to_string(root.join(".repotidy/report.md")).unwrap();
    assert!(report.contains("debug.log"));
    assert!(report.contains("Button"));

    let apply = repotidy(&["apply"], root);
    assert!(apply.status.success(), "{}", String::from_utf8_lossy(&apply.stderr));
    let stdout = String::from_utf8_lossy(&apply.stdout);
    assert!(stdout.contains("applied delete debug.log"));
    assert!(stdout.contains("2 applied, 0 failed, 2 total"));

    assert!(root.join("docs/setup.md").exists());
    assert!(!root.join("packages/widget/docs/setup.md").exists());
    assert!(!root.join("debug.log").exists());
    assert!(root.join(".repotidy/journal.json").is_file());

    let verify = repotidy(&["verify"], root);
    assert!(verify.status.success());
}

#[test]
fn test_apply_partial_failure_exits_nonzero() {
    let temp = example_repo();
    let root = temp.path();

    assert!(repotidy(&["plan", "--quiet"], root).status.success());
    fs::remove_file(root.join("debug.log")).unwrap();

    let apply = repotidy(&["apply"], root);
    assert!(!apply.status.success());
    let stdout = String::from_utf8_lossy(&apply.stdout);
    assert!(stdout.contains("failed delete debug.log: source does not exist"));
    assert!(stdout.contains("1 applied, 1 failed, 2 total"));
    // The other action still ran.
    assert!(!root.join("packages/widget/docs/setup.md").exists());
}

#[test]
fn test_missing_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let plan = repotidy(&["plan", "does-not-exist"], temp.path());
    assert!(!plan.status.success());
    assert!(!temp.path().join(".repotidy").exists());
}

#[test]
fn test_revert_restores_archive() {
    let temp = example_repo();
    let root = temp.path();

    assert!(repotidy(&["plan", "--quiet"], root).status.success());
    assert!(repotidy(&["apply"], root).status.success());

    let revert = repotidy(&["revert"], root);
    assert!(revert.status.success());
    assert!(root.join("packages/widget/docs/setup.md").exists());
    assert!(!root.join(".repotidy/journal.json").exists());
}
