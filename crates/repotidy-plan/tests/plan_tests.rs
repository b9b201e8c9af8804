use std::fs;
use std::path::Path;

use repotidy_core::{Classifier, FileSet, PlanConfig, RuleSet, ScanConfig};
use repotidy_plan::{
    DUPLICATE_DOCS_REASON, PlanBuilder, TEMP_FILE_REASON, load_plan, write_artifacts,
};
use repotidy_scan::TreeWalker;
use tempfile::TempDir;

fn write(root: &Path, path: &str, contents: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, contents).unwrap();
}

fn scan(root: &Path, rules: RuleSet) -> FileSet {
    let classifier = Classifier::new(rules).unwrap();
    TreeWalker::new()
        .scan(&ScanConfig::new(root), &classifier)
        .unwrap()
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
fn test_example_scenario_plan() {
    let temp = example_repo();
    let files = scan(temp.path(), RuleSet::default());
    let config = PlanConfig::default();

    let plan = PlanBuilder::new(&config).plan(&files);

    assert_eq!(plan.summary.total_files, 4);
    assert_eq!(plan.summary.duplicate_groups.len(), 1);
    assert_eq!(
        plan.summary.duplicate_groups[0].paths,
        vec!["docs/setup.md", "packages/widget/docs/setup.md"]
    );

    let components: Vec<&str> = plan
        .summary
        .unreferenced_components
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(components, vec!["Button"]);

    assert_eq!(plan.actions.len(), 2);
    assert_eq!(plan.count_kind("delete"), 1);
    assert_eq!(plan.count_kind("archive"), 1);

    let delete = plan.actions.iter().find(|a| a.kind() == "delete").unwrap();
    assert_eq!(delete.source(), "debug.log");
    assert_eq!(delete.reason(), TEMP_FILE_REASON);

    let archive = plan.actions.iter().find(|a| a.kind() == "archive").unwrap();
    assert_eq!(archive.source(), "packages/widget/docs/setup.md");
    assert_eq!(
        archive.target(),
        Some(".repotidy/archive/duplicates/packages/widget/docs/setup.md")
    );
    assert_eq!(archive.reason(), DUPLICATE_DOCS_REASON);

    // Review candidates never become actions.
    assert!(
        plan.actions
            .iter()
            .all(|a| a.source() != "packages/widget/Button.tsx")
    );
}

#[test]
fn test_protected_files_never_become_sources() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    for prefix in ["", "legacy/"] {
        write(root, &format!("{prefix}debug.log"), "log\n");
        write(root, &format!("{prefix}notes.tmp"), "tmp\n");
        write(root, &format!("{prefix}pkg/README.md"), &format!("{prefix} readme\n"));
        write(root, &format!("{prefix}guide/a.md"), &format!("{prefix} same\n"));
        write(root, &format!("{prefix}guide/b.md"), &format!("{prefix} same\n"));
        write(root, &format!("{prefix}.DS_Store"), "junk\n");
    }

    let rules = RuleSet::builder()
        .protected_prefixes(vec!["legacy/".to_string()])
        .build()
        .unwrap();
    let files = scan(root, rules);
    let config = PlanConfig::default();
    let plan = PlanBuilder::new(&config).plan(&files);

    assert!(!plan.is_empty());
    for action in &plan.actions {
        assert!(
            !action.source().starts_with("legacy/"),
            "protected source in plan: {action}"
        );
    }
    // The unprotected twins are all proposed.
    assert_eq!(plan.count_kind("delete"), 3);
    assert_eq!(plan.count_kind("move"), 1);
    assert_eq!(plan.count_kind("archive"), 1);
}

#[test]
fn test_artifacts_round_trip() {
    let temp = example_repo();
    let files = scan(temp.path(), RuleSet::default());
    let config = PlanConfig::default();
    let plan = PlanBuilder::new(&config).plan(&files);

    let artifacts = write_artifacts(&plan, &files.root).unwrap();
    let loaded = load_plan(&artifacts.plan_path).unwrap();
    assert_eq!(loaded, plan);

    let report = fs::read_to_string(&artifacts.report_path).unwrap();
    assert!(report.contains("**delete** `debug.log`: temporary file."));
    assert!(report.contains("`packages/widget/Button.tsx` (`Button`)"));
}

#[test]
fn test_state_dir_is_not_planned_again() {
    let temp = example_repo();
    let config = PlanConfig::default();

    let first = PlanBuilder::new(&config).plan(&scan(temp.path(), RuleSet::default()));
    write_artifacts(&first, temp.path()).unwrap();

    // The written plan.json and report.md live in the excluded state dir.
    let second = PlanBuilder::new(&config).plan(&scan(temp.path(), RuleSet::default()));
    assert_eq!(first.actions, second.actions);
    assert_eq!(second.summary.total_files, 4);
}

#[test]
fn test_duplicate_thresholds_come_from_plan_config() {
    let temp = example_repo();
    let files = scan(temp.path(), RuleSet::default());
    let config = PlanConfig::builder()
        .duplicate_min_size(1024u64)
        .build()
        .unwrap();

    let plan = PlanBuilder::new(&config).plan(&files);

    assert!(plan.summary.duplicate_groups.is_empty());
    assert_eq!(plan.count_kind("archive"), 0);
    assert_eq!(plan.count_kind("delete"), 1);
}
