//! Folding analyzer output into a cleanup plan.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use repotidy_analyze::{
    DuplicateConfig, DuplicateFinder, DuplicateReport, ReferenceAnalyzer, ReferenceReport,
    split_group,
};
use repotidy_core::{
    Category, CleanupAction, CleanupPlan, FileRecord, FileSet, PLAN_VERSION, PlanConfig,
    PlanSummary,
};

/// Reason attached to temp-file deletions.
pub const TEMP_FILE_REASON: &str = "temporary file.";

/// Reason attached to duplicate doc archival.
pub const DUPLICATE_DOCS_REASON: &str = "duplicate documentation.";

/// Reason attached to index/readme consolidation.
pub const CONSOLIDATE_DOCS_REASON: &str = "consolidate documentation.";

/// Builds cleanup plans. Pure: reads nothing from disk.
#[derive(Debug, Clone)]
pub struct PlanBuilder<'a> {
    config: &'a PlanConfig,
}

impl<'a> PlanBuilder<'a> {
    /// Create a builder for the given settings.
    pub fn new(config: &'a PlanConfig) -> Self {
        Self { config }
    }

    /// Run both analyzers over `files` and build a plan stamped with the current time.
    ///
    /// Unlike [`build`](Self::build) this reads file contents for the
    /// reference search.
    pub fn plan(&self, files: &FileSet) -> CleanupPlan {
        let finder = DuplicateFinder::with_config(DuplicateConfig::from_plan_config(self.config));
        let duplicates = finder.find_duplicates(files);
        let references = ReferenceAnalyzer::from_plan_config(self.config).analyze(files);
        self.build(files, &duplicates, &references, Utc::now())
    }

    /// Fold analyzer results into a plan.
    ///
    /// Each file is the source of at most one action. Rules are applied in
    /// priority order (temp deletion, duplicate doc archival, index/readme
    /// consolidation) and a file claimed by an earlier rule is skipped by the
    /// later ones.
    pub fn build(
        &self,
        files: &FileSet,
        duplicates: &DuplicateReport,
        references: &ReferenceReport,
        timestamp: DateTime<Utc>,
    ) -> CleanupPlan {
        let mut state = BuildState::default();

        for record in files.in_category(Category::Temp) {
            state.push(record, |r| CleanupAction::delete(r, TEMP_FILE_REASON));
        }

        for group in &duplicates.groups {
            let Some((keep, rest)) = split_group(group, files, self.config.keep_policy) else {
                tracing::warn!(hash = %group.hash, "duplicate group refers to unknown files");
                continue;
            };
            let all_docs = std::iter::once(keep)
                .chain(rest.iter().copied())
                .all(|r| r.category == Category::Docs);
            if !all_docs {
                continue;
            }
            tracing::debug!(keep = %keep.path, redundant = rest.len(), "duplicate docs");
            for record in rest {
                let target = self.config.duplicate_target(&record.path);
                state.push(record, |r| {
                    CleanupAction::archive(r, target, DUPLICATE_DOCS_REASON)
                });
            }
        }

        let docs_archive = self.config.docs_archive();
        for record in files.in_category(Category::Docs) {
            if !self.is_index_doc(record) || state.is_claimed(&record.path) {
                continue;
            }
            let target = state.unique_target(&docs_archive, record);
            state.push(record, |r| {
                CleanupAction::move_to(r, target, CONSOLIDATE_DOCS_REASON)
            });
        }

        let actions = drop_protected(state.actions, files);
        let summary = summarize(files, duplicates, references, &actions);

        tracing::debug!(
            actions = actions.len(),
            duplicate_groups = summary.duplicate_groups.len(),
            "plan built"
        );

        CleanupPlan {
            version: PLAN_VERSION,
            timestamp,
            root: files.root.clone(),
            summary,
            actions,
        }
    }

    /// Whether a docs record is a non-root index/readme file.
    fn is_index_doc(&self, record: &FileRecord) -> bool {
        if record.is_root_level() {
            return false;
        }
        let stem = record.stem();
        self.config
            .index_names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(stem))
    }
}

#[derive(Default)]
struct BuildState {
    actions: Vec<CleanupAction>,
    claimed: HashSet<String>,
    targets: HashSet<String>,
}

impl BuildState {
    fn is_claimed(&self, path: &str) -> bool {
        self.claimed.contains(path)
    }

    fn push(&mut self, record: &FileRecord, make: impl FnOnce(&FileRecord) -> CleanupAction) {
        if !self.claimed.insert(record.path.clone()) {
            return;
        }
        let action = make(record);
        if let Some(target) = action.target() {
            self.targets.insert(target.to_string());
        }
        self.actions.push(action);
    }

    /// `<dir>/<parent-with-dashes>-<name>`, suffixed with `-2`, `-3`, ... if taken.
    fn unique_target(&self, dir: &str, record: &FileRecord) -> String {
        let prefix = record.parent().unwrap_or_default().replace('/', "-");
        let name = record.file_name();
        let candidate = format!("{dir}/{prefix}-{name}");
        if !self.targets.contains(&candidate) {
            return candidate;
        }

        let stem = record.stem();
        let ext = &name[stem.len()..];
        (2u32..)
            .map(|n| format!("{dir}/{prefix}-{stem}-{n}{ext}"))
            .find(|c| !self.targets.contains(c))
            .unwrap_or(candidate)
    }
}

/// Remove every action whose source is protected.
///
/// The rules above never select protected files, so this only fires if a
/// rule or the ruleset is wrong. It must not panic either way.
pub(crate) fn drop_protected(actions: Vec<CleanupAction>, files: &FileSet) -> Vec<CleanupAction> {
    actions
        .into_iter()
        .filter(|action| match files.get(action.source()) {
            Some(record) if record.is_protected() => {
                tracing::warn!(source = action.source(), "dropping action on protected file");
                false
            }
            _ => true,
        })
        .collect()
}

fn summarize(
    files: &FileSet,
    duplicates: &DuplicateReport,
    references: &ReferenceReport,
    actions: &[CleanupAction],
) -> PlanSummary {
    let mut unnecessary_docs: Vec<String> = actions
        .iter()
        .filter(|a| {
            files
                .get(a.source())
                .is_some_and(|r| r.category == Category::Docs)
        })
        .map(|a| a.source().to_string())
        .collect();
    unnecessary_docs.sort();

    PlanSummary {
        total_files: files.len() as u64,
        total_bytes: files.total_bytes(),
        by_category: files.category_counts(),
        duplicate_groups: duplicates.groups.clone(),
        temp_files: files
            .in_category(Category::Temp)
            .map(|r| r.path.clone())
            .collect(),
        unnecessary_docs,
        unused_assets: references.unused_assets.clone(),
        unreferenced_components: references.unreferenced_components.clone(),
        scan_warnings: files.warnings.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repotidy_core::{ContentHash, ScannedFile};

    fn record(path: &str, content: u8, category: Category) -> FileRecord {
        ScannedFile {
            path: path.to_string(),
            size: 16,
            content_hash: ContentHash::new([content; 32]),
            last_modified: Utc::now(),
        }
        .into_record(category)
    }

    fn build(files: &FileSet) -> CleanupPlan {
        let config = PlanConfig::default();
        let duplicates = DuplicateFinder::new().find_duplicates(files);
        PlanBuilder::new(&config).build(files, &duplicates, &ReferenceReport::default(), Utc::now())
    }

    #[test]
    fn test_temp_files_are_deleted() {
        let files = FileSet::from_records(
            "/repo",
            vec![
                record("debug.log", 1, Category::Temp),
                record("src/main.rs", 2, Category::Source),
            ],
        );
        let plan = build(&files);

        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].kind(), "delete");
        assert_eq!(plan.actions[0].reason(), TEMP_FILE_REASON);
        assert_eq!(plan.summary.temp_files, vec!["debug.log"]);
    }

    #[test]
    fn test_mixed_category_duplicates_are_reported_only() {
        let files = FileSet::from_records(
            "/repo",
            vec![
                record("docs/logo.png", 7, Category::Docs),
                record("public/logo.png", 7, Category::Assets),
                record("a/icon.png", 8, Category::Assets),
                record("b/icon.png", 8, Category::Assets),
            ],
        );
        let plan = build(&files);

        assert!(plan.actions.is_empty());
        assert_eq!(plan.summary.duplicate_groups.len(), 2);
    }

    #[test]
    fn test_readme_consolidation_targets_are_unique() {
        let files = FileSet::from_records(
            "/repo",
            vec![
                record("README.md", 1, Category::Docs),
                record("a/b/README.md", 2, Category::Docs),
                record("a-b/README.md", 3, Category::Docs),
                record("pkg/index.md", 4, Category::Docs),
                record("pkg/guide.md", 5, Category::Docs),
            ],
        );
        let plan = build(&files);

        let targets: Vec<&str> = plan.actions.iter().filter_map(|a| a.target()).collect();
        assert_eq!(
            targets,
            vec![
                ".repotidy/archive/docs/a-b-README.md",
                ".repotidy/archive/docs/a-b-README-2.md",
                ".repotidy/archive/docs/pkg-index.md",
            ]
        );
        assert!(plan.actions.iter().all(|a| a.source() != "README.md"));
        assert_eq!(plan.summary.unnecessary_docs.len(), 3);
    }

    #[test]
    fn test_each_source_has_one_action() {
        // An index file that is also a redundant duplicate is archived, not moved.
        let files = FileSet::from_records(
            "/repo",
            vec![
                record("docs/README.md", 9, Category::Docs),
                record("pkg/README.md", 9, Category::Docs),
            ],
        );
        let plan = build(&files);

        assert_eq!(plan.actions.len(), 2);
        let pkg: Vec<&CleanupAction> = plan
            .actions
            .iter()
            .filter(|a| a.source() == "pkg/README.md")
            .collect();
        assert_eq!(pkg.len(), 1);
        assert_eq!(pkg[0].kind(), "archive");

        let docs = plan
            .actions
            .iter()
            .find(|a| a.source() == "docs/README.md")
            .unwrap();
        assert_eq!(docs.kind(), "move");
    }

    #[test]
    fn test_drop_protected_filters_bad_actions() {
        let protected = record(".github/CODEOWNERS", 1, Category::Protected);
        let temp = record("tmp.log", 2, Category::Temp);
        let files = FileSet::from_records("/repo", vec![protected.clone(), temp.clone()]);

        let actions = vec![
            CleanupAction::delete(&protected, "bad"),
            CleanupAction::delete(&temp, TEMP_FILE_REASON),
        ];
        let kept = drop_protected(actions, &files);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source(), "tmp.log");
    }
}
