//! Post-apply postcondition checks.

use std::path::Path;

use serde::Serialize;

use repotidy_core::{CleanupAction, CleanupPlan};

use crate::fs::{ESCAPES_ROOT, FileSystem, join_within};
use crate::journal::Journal;

/// An action whose effect is not visible on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyIssue {
    /// Position in the plan.
    pub index: usize,
    /// The action checked.
    pub action: CleanupAction,
    /// What does not hold.
    pub problem: String,
}

/// Result of checking a plan against the tree.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerifyReport {
    /// Number of actions checked.
    pub checked: usize,
    /// Every unmet postcondition.
    pub issues: Vec<VerifyIssue>,
}

impl VerifyReport {
    /// Whether every postcondition holds.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check that each action of `plan` took effect under `root`.
///
/// The source must be gone and, for moves and archives, the target must
/// exist. When a journal is given, redirected targets are looked up there.
pub fn verify_plan(
    fs: &dyn FileSystem,
    root: &Path,
    plan: &CleanupPlan,
    journal: Option<&Journal>,
) -> VerifyReport {
    let mut issues = Vec::new();

    for (index, action) in plan.actions.iter().enumerate() {
        let mut problems = Vec::new();

        match join_within(root, action.source()) {
            Some(source) if fs.exists(&source) => {
                problems.push("source still exists".to_string());
            }
            Some(_) => {}
            None => problems.push(format!("source {}", ESCAPES_ROOT)),
        }

        if let Some(planned) = action.target() {
            let target = journal
                .and_then(|j| j.destination_of(action.source()))
                .unwrap_or(planned);
            match join_within(root, target) {
                Some(path) if !fs.exists(&path) => {
                    problems.push(format!("target {target} is missing"));
                }
                Some(_) => {}
                None => problems.push(format!("target {}", ESCAPES_ROOT)),
            }
        }

        if !problems.is_empty() {
            issues.push(VerifyIssue {
                index,
                action: action.clone(),
                problem: problems.join("; "),
            });
        }
    }

    tracing::debug!(checked = plan.actions.len(), issues = issues.len(), "verify complete");

    VerifyReport {
        checked: plan.actions.len(),
        issues,
    }
}
