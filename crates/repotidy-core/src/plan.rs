//! Plan data model: duplicate groups, review candidates, actions and plans.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{Category, ContentHash, FileRecord};

/// Current plan document format version.
pub const PLAN_VERSION: u32 = 1;

/// Two or more files with byte-identical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Content hash shared by all members.
    pub hash: ContentHash,
    /// Size of each member in bytes.
    pub size: u64,
    /// Member paths, sorted.
    pub paths: Vec<String>,
}

impl DuplicateGroup {
    /// Number of members.
    pub fn count(&self) -> usize {
        self.paths.len()
    }

    /// How many members could go if one is kept.
    pub fn deletable_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Bytes held by the redundant copies.
    pub fn wasted_bytes(&self) -> u64 {
        self.size * self.deletable_count() as u64
    }
}

/// A file that a textual search found no mention of.
///
/// This is a heuristic result meant for human review. It intentionally
/// carries no [`FileRecord`], so it cannot be turned into a
/// [`CleanupAction`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnreferencedCandidate {
    /// Path of the candidate file.
    pub path: String,
    /// The text that was searched for.
    pub name: String,
}

/// A single proposed filesystem mutation.
///
/// Serialized as `{"kind": "delete" | "move" | "archive", "source", "target"?, "reason"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CleanupAction {
    /// Remove the source file.
    Delete { source: String, reason: String },
    /// Rename the source to the target.
    Move {
        source: String,
        target: String,
        reason: String,
    },
    /// Copy the source to the target, then remove the source.
    Archive {
        source: String,
        target: String,
        reason: String,
    },
}

impl CleanupAction {
    /// Propose deleting a scanned file.
    pub fn delete(record: &FileRecord, reason: impl Into<String>) -> Self {
        Self::Delete {
            source: record.path.clone(),
            reason: reason.into(),
        }
    }

    /// Propose moving a scanned file.
    pub fn move_to(record: &FileRecord, target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Move {
            source: record.path.clone(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Propose archiving a scanned file.
    pub fn archive(record: &FileRecord, target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Archive {
            source: record.path.clone(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Lowercase kind name as it appears in the plan document.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Delete { .. } => "delete",
            Self::Move { .. } => "move",
            Self::Archive { .. } => "archive",
        }
    }

    /// Source path, relative to the scan root.
    pub fn source(&self) -> &str {
        match self {
            Self::Delete { source, .. }
            | Self::Move { source, .. }
            | Self::Archive { source, .. } => source,
        }
    }

    /// Target path for move and archive.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Delete { .. } => None,
            Self::Move { target, .. } | Self::Archive { target, .. } => Some(target),
        }
    }

    /// Human-readable justification.
    pub fn reason(&self) -> &str {
        match self {
            Self::Delete { reason, .. }
            | Self::Move { reason, .. }
            | Self::Archive { reason, .. } => reason,
        }
    }
}

impl std::fmt::Display for CleanupAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.target() {
            Some(target) => write!(f, "{} {} -> {}", self.kind(), self.source(), target),
            None => write!(f, "{} {}", self.kind(), self.source()),
        }
    }
}

/// Counts and review lists accompanying a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    /// Number of files scanned.
    pub total_files: u64,
    /// Bytes across all scanned files.
    #[serde(default)]
    pub total_bytes: u64,
    /// Files per category.
    #[serde(default)]
    pub by_category: BTreeMap<Category, u64>,
    /// Every duplicate group, whatever its category.
    pub duplicate_groups: Vec<DuplicateGroup>,
    /// Temp-category paths.
    pub temp_files: Vec<String>,
    /// Docs proposed for archival or consolidation.
    pub unnecessary_docs: Vec<String>,
    /// Assets whose file name is never mentioned.
    pub unused_assets: Vec<UnreferencedCandidate>,
    /// Component sources whose bare name is never mentioned.
    pub unreferenced_components: Vec<UnreferencedCandidate>,
    /// Non-fatal problems hit while scanning.
    #[serde(default)]
    pub scan_warnings: usize,
}

/// The unit of persistence and review between `plan` and `apply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupPlan {
    /// Document format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// When the plan was generated.
    pub timestamp: DateTime<Utc>,
    /// Root the plan was generated for.
    #[serde(default)]
    pub root: PathBuf,
    /// Counts and review lists.
    pub summary: PlanSummary,
    /// Ordered, independent actions.
    pub actions: Vec<CleanupAction>,
}

fn default_version() -> u32 {
    PLAN_VERSION
}

impl CleanupPlan {
    /// Number of actions of the given kind.
    pub fn count_kind(&self, kind: &str) -> usize {
        self.actions.iter().filter(|a| a.kind() == kind).count()
    }

    /// Whether the plan proposes anything.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ScannedFile;

    fn record(path: &str) -> FileRecord {
        ScannedFile {
            path: path.to_string(),
            size: 10,
            content_hash: ContentHash::new([7; 32]),
            last_modified: Utc::now(),
        }
        .into_record(Category::Temp)
    }

    #[test]
    fn test_action_json_shape() {
        let delete = CleanupAction::delete(&record("debug.log"), "temporary file.");
        let json = serde_json::to_value(&delete).unwrap();
        assert_eq!(json["kind"], "delete");
        assert_eq!(json["source"], "debug.log");
        assert!(json.get("target").is_none());

        let archive = CleanupAction::archive(&record("a.md"), ".repotidy/archive/a.md", "dup");
        let json = serde_json::to_value(&archive).unwrap();
        assert_eq!(json["kind"], "archive");
        assert_eq!(json["target"], ".repotidy/archive/a.md");
    }

    #[test]
    fn test_action_accessors() {
        let action = CleanupAction::move_to(&record("pkg/README.md"), "out/pkg-README.md", "why");
        assert_eq!(action.kind(), "move");
        assert_eq!(action.source(), "pkg/README.md");
        assert_eq!(action.target(), Some("out/pkg-README.md"));
        assert_eq!(action.reason(), "why");
        assert_eq!(action.to_string(), "move pkg/README.md -> out/pkg-README.md");
    }

    #[test]
    fn test_duplicate_group_counts() {
        let group = DuplicateGroup {
            hash: ContentHash::new([0xaa; 32]),
            size: 4096,
            paths: vec!["a".into(), "b".into(), "c".into()],
        };
        assert_eq!(group.count(), 3);
        assert_eq!(group.deletable_count(), 2);
        assert_eq!(group.wasted_bytes(), 8192);
    }

    #[test]
    fn test_summary_uses_camel_case() {
        let mut summary = PlanSummary::default();
        summary.by_category.insert(Category::Docs, 2);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("totalFiles").is_some());
        assert!(json.get("unreferencedComponents").is_some());
        assert_eq!(json["byCategory"]["docs"], 2);
    }
}
