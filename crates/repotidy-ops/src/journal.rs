//! Journal of applied changes, and reverting them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use repotidy_core::{CleanupAction, STATE_DIR};

use crate::error::{JournalError, OperationError};
use crate::fs::{ESCAPES_ROOT, FileSystem, join_within};
use crate::outcome::ApplyReport;

/// File name of the journal inside the state directory.
pub const JOURNAL_FILE_NAME: &str = "journal.json";

/// Where `apply` writes its journal for a root.
pub fn default_journal_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(JOURNAL_FILE_NAME)
}

/// A change made by an applied action.
///
/// Paths are relative to the journal's root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UndoableChange {
    /// A file was renamed.
    Moved { from: String, to: String },
    /// A file was copied to `to` and the original removed.
    Archived { from: String, to: String },
    /// A file was deleted, either unlinked or sent to the trash.
    Deleted { path: String, trashed: bool },
}

impl UndoableChange {
    /// Check if this change can be reverted from the journal alone.
    pub fn can_undo(&self) -> bool {
        !matches!(self, Self::Deleted { .. })
    }

    /// Get a description of how to undo this change.
    pub fn undo_description(&self) -> String {
        match self {
            Self::Moved { from, to } => format!("Move {to} back to {from}"),
            Self::Archived { from, to } => format!("Restore {from} from {to}"),
            Self::Deleted { path, trashed: true } => {
                format!("Restore {path} from the system trash")
            }
            Self::Deleted { path, trashed: false } => {
                format!("Cannot undo permanent deletion of {path}")
            }
        }
    }
}

/// An entry in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position of the action in the applied plan.
    pub index: usize,
    /// The change that was made.
    pub change: UndoableChange,
}

/// Record of one apply run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    /// When the run finished.
    pub applied_at: DateTime<Utc>,
    /// Root the run was applied to.
    pub root: PathBuf,
    /// Changes in the order they were made.
    pub entries: Vec<JournalEntry>,
}

impl Journal {
    /// Record every applied action of a report.
    pub fn from_report(root: impl Into<PathBuf>, report: &ApplyReport) -> Self {
        let entries = report
            .outcomes
            .iter()
            .filter(|o| o.is_applied())
            .map(|o| {
                let change = match &o.action {
                    CleanupAction::Delete { source, .. } => UndoableChange::Deleted {
                        path: source.clone(),
                        trashed: o.trashed,
                    },
                    CleanupAction::Move { source, .. } => UndoableChange::Moved {
                        from: source.clone(),
                        to: o.final_target().unwrap_or_default().to_string(),
                    },
                    CleanupAction::Archive { source, .. } => UndoableChange::Archived {
                        from: source.clone(),
                        to: o.final_target().unwrap_or_default().to_string(),
                    },
                };
                JournalEntry {
                    index: o.index,
                    change,
                }
            })
            .collect();

        Self {
            applied_at: Utc::now(),
            root: root.into(),
            entries,
        }
    }

    /// Where a source ended up, if it was moved or archived.
    pub fn destination_of(&self, source: &str) -> Option<&str> {
        self.entries.iter().find_map(|e| match &e.change {
            UndoableChange::Moved { from, to } | UndoableChange::Archived { from, to }
                if from == source =>
            {
                Some(to.as_str())
            }
            _ => None,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the journal is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the journal as JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), JournalError> {
        let write_err = |source| JournalError::Write {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|source| JournalError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, json).map_err(write_err)
    }

    /// Read a journal written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self, JournalError> {
        let text = std::fs::read_to_string(path).map_err(|source| JournalError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| JournalError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Result of reverting a journal.
#[derive(Debug, Clone, Default)]
pub struct RevertReport {
    /// Changes undone.
    pub restored: usize,
    /// Changes that could not be undone.
    pub failed: usize,
    /// Changes that cannot be undone from the journal.
    pub skipped: usize,
    /// One error per failed or skipped change.
    pub errors: Vec<OperationError>,
}

impl RevertReport {
    /// Check if every revertible change was undone.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} restored, {} failed, {} not revertible",
            self.restored, self.failed, self.skipped
        )
    }
}

/// Undo a journal, newest change first.
///
/// Moves are renamed back. Archives are copied back and the archive copy is
/// removed only after that copy succeeded. Deletions are skipped.
pub fn revert(journal: &Journal, fs: &dyn FileSystem) -> RevertReport {
    let mut report = RevertReport::default();

    for entry in journal.entries.iter().rev() {
        let result = match &entry.change {
            UndoableChange::Deleted { path, .. } => {
                report.skipped += 1;
                report.errors.push(OperationError::new(
                    path,
                    entry.change.undo_description(),
                ));
                continue;
            }
            UndoableChange::Moved { from, to } => {
                restore(fs, &journal.root, to, from, |a, b| fs.rename(a, b))
            }
            UndoableChange::Archived { from, to } => {
                restore(fs, &journal.root, to, from, |a, b| {
                    fs.copy(a, b)?;
                    fs.remove_file(a)
                })
            }
        };

        match result {
            Ok(()) => {
                tracing::info!(change = %entry.change.undo_description(), "reverted");
                report.restored += 1;
            }
            Err(error) => {
                tracing::warn!(path = %error.path.display(), "revert failed: {}", error.message);
                report.failed += 1;
                report.errors.push(error);
            }
        }
    }

    report
}

/// Bring `current` back to `original` without overwriting anything.
fn restore(
    fs: &dyn FileSystem,
    root: &Path,
    current: &str,
    original: &str,
    step: impl FnOnce(&Path, &Path) -> std::io::Result<()>,
) -> Result<(), OperationError> {
    let from =
        join_within(root, current).ok_or_else(|| OperationError::new(current, ESCAPES_ROOT))?;
    let to =
        join_within(root, original).ok_or_else(|| OperationError::new(original, ESCAPES_ROOT))?;

    if !fs.exists(&from) {
        return Err(OperationError::new(from, "no longer exists"));
    }
    if fs.exists(&to) {
        return Err(OperationError::new(to, "original path is occupied"));
    }
    if let Some(parent) = to.parent() {
        fs.create_dir_all(parent)
            .map_err(|e| OperationError::new(parent, e.to_string()))?;
    }
    step(&from, &to).map_err(|e| OperationError::new(from.clone(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::StdFileSystem;
    use crate::outcome::{ActionOutcome, ActionState};
    use tempfile::TempDir;

    fn applied(index: usize, action: CleanupAction) -> ActionOutcome {
        let mut outcome = ActionOutcome::pending(index, action);
        outcome.state = ActionState::Applied;
        outcome
    }

    #[test]
    fn test_journal_records_applied_only() {
        let mut failed = ActionOutcome::pending(
            1,
            CleanupAction::Delete {
                source: "gone.log".into(),
                reason: "temporary file.".into(),
            },
        );
        failed.state = ActionState::Failed {
            reason: "source does not exist".into(),
        };
        let mut redirected = applied(
            2,
            CleanupAction::Move {
                source: "pkg/README.md".into(),
                target: "out/pkg-README.md".into(),
                reason: "consolidate documentation.".into(),
            },
        );
        redirected.redirected_to = Some("out/pkg-README (1).md".into());

        let report = ApplyReport::from_outcomes(vec![failed, redirected]);
        let journal = Journal::from_report("/repo", &report);

        assert_eq!(journal.len(), 1);
        assert_eq!(journal.entries[0].index, 2);
        assert_eq!(
            journal.destination_of("pkg/README.md"),
            Some("out/pkg-README (1).md")
        );
    }

    #[test]
    fn test_undo_descriptions() {
        let deleted = UndoableChange::Deleted {
            path: "a.log".into(),
            trashed: false,
        };
        assert!(!deleted.can_undo());
        assert!(deleted.undo_description().contains("Cannot undo"));

        let moved = UndoableChange::Moved {
            from: "a".into(),
            to: "b".into(),
        };
        assert!(moved.can_undo());
        assert_eq!(moved.undo_description(), "Move b back to a");
    }

    #[test]
    fn test_revert_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.md"), "recreated").unwrap();
        std::fs::write(temp.path().join("b.md"), "moved").unwrap();

        let journal = Journal {
            applied_at: Utc::now(),
            root: temp.path().to_path_buf(),
            entries: vec![JournalEntry {
                index: 0,
                change: UndoableChange::Moved {
                    from: "a.md".into(),
                    to: "b.md".into(),
                },
            }],
        };

        let report = revert(&journal, &StdFileSystem);
        assert_eq!(report.failed, 1);
        assert_eq!(
            std::fs::read_to_string(temp.path().join("a.md")).unwrap(),
            "recreated"
        );
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = default_journal_path(temp.path());
        let journal = Journal {
            applied_at: Utc::now(),
            root: temp.path().to_path_buf(),
            entries: vec![JournalEntry {
                index: 4,
                change: UndoableChange::Deleted {
                    path: "x.tmp".into(),
                    trashed: true,
                },
            }],
        };

        journal.save(&path).unwrap();
        assert_eq!(Journal::load(&path).unwrap(), journal);
    }
}
