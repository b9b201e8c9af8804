//! Plan executor.
//!
//! Actions run one at a time in plan order. Nothing is retried, and no action
//! depends on another having succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use repotidy_core::{CleanupAction, CleanupPlan};

use crate::APPLY_CHANNEL_SIZE;
use crate::conflict::{ConflictResolution, auto_rename_path};
use crate::fs::{ESCAPES_ROOT, FileSystem, StdFileSystem, join_within};
use crate::outcome::{ActionOutcome, ActionState, ApplyEvent, ApplyReport};

/// Applies cleanup actions relative to a root directory.
#[derive(Debug)]
pub struct PlanExecutor<F: FileSystem = StdFileSystem> {
    root: PathBuf,
    fs: Arc<F>,
    /// How to handle existing targets.
    pub resolution: ConflictResolution,
    /// Whether deletions go to the trash.
    pub use_trash: bool,
}

impl<F: FileSystem> Clone for PlanExecutor<F> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            fs: Arc::clone(&self.fs),
            resolution: self.resolution,
            use_trash: self.use_trash,
        }
    }
}

impl PlanExecutor<StdFileSystem> {
    /// Create an executor on the real filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_fs(root, StdFileSystem)
    }
}

impl<F: FileSystem + 'static> PlanExecutor<F> {
    /// Create an executor over a custom filesystem.
    pub fn with_fs(root: impl Into<PathBuf>, fs: F) -> Self {
        Self {
            root: root.into(),
            fs: Arc::new(fs),
            resolution: ConflictResolution::default(),
            use_trash: false,
        }
    }

    /// Set the conflict resolution.
    pub fn with_resolution(mut self, resolution: ConflictResolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Send deletions to the trash instead of unlinking.
    pub fn with_trash(mut self, use_trash: bool) -> Self {
        self.use_trash = use_trash;
        self
    }

    /// Root the plan's relative paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The filesystem this executor mutates.
    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Apply every action of a plan and return the tally.
    pub fn apply(&self, plan: &CleanupPlan) -> ApplyReport {
        let outcomes = plan
            .actions
            .iter()
            .enumerate()
            .map(|(index, action)| self.apply_action(index, action))
            .collect();
        ApplyReport::from_outcomes(outcomes)
    }

    /// Apply a plan, streaming one event per action.
    ///
    /// Must be called from within a tokio runtime. Each action runs on the
    /// blocking pool; the next one starts only after the previous finished.
    pub fn start_apply(&self, plan: &CleanupPlan) -> mpsc::Receiver<ApplyEvent> {
        let (tx, rx) = mpsc::channel(APPLY_CHANNEL_SIZE);
        let executor = self.clone();
        let actions = plan.actions.clone();

        tokio::spawn(async move {
            let _ = tx
                .send(ApplyEvent::Started {
                    total: actions.len(),
                })
                .await;

            let mut outcomes = Vec::with_capacity(actions.len());
            for (index, action) in actions.into_iter().enumerate() {
                let worker = executor.clone();
                let fallback = action.clone();
                let outcome = tokio::task::spawn_blocking(move || {
                    worker.apply_action(index, &action)
                })
                .await
                .unwrap_or_else(|e| {
                    let mut outcome = ActionOutcome::pending(index, fallback);
                    outcome.state = ActionState::Failed {
                        reason: format!("worker task failed: {e}"),
                    };
                    outcome
                });

                // Keep going even if the receiver is gone so the batch completes.
                let _ = tx.send(ApplyEvent::Outcome(outcome.clone())).await;
                outcomes.push(outcome);
            }

            let _ = tx
                .send(ApplyEvent::Complete(ApplyReport::from_outcomes(outcomes)))
                .await;
        });

        rx
    }

    /// Apply one action. Never panics; every failure becomes the outcome.
    pub fn apply_action(&self, index: usize, action: &CleanupAction) -> ActionOutcome {
        let mut outcome = ActionOutcome::pending(index, action.clone());

        let result = match action {
            CleanupAction::Delete { source, .. } => self.delete(source).map(|trashed| {
                outcome.trashed = trashed;
            }),
            CleanupAction::Move { source, target, .. } => {
                self.relocate(source, target, false).map(|redirect| {
                    outcome.redirected_to = redirect;
                })
            }
            CleanupAction::Archive { source, target, .. } => {
                self.relocate(source, target, true).map(|redirect| {
                    outcome.redirected_to = redirect;
                })
            }
        };

        outcome.state = match result {
            Ok(()) => ActionState::Applied,
            Err(reason) => ActionState::Failed { reason },
        };

        match &outcome.state {
            ActionState::Failed { reason } => {
                tracing::warn!(
                    kind = action.kind(),
                    source = action.source(),
                    to = action.target(),
                    plan_reason = action.reason(),
                    "action failed: {reason}"
                );
            }
            _ => {
                tracing::info!(
                    kind = action.kind(),
                    source = action.source(),
                    to = outcome.final_target(),
                    "action applied"
                );
            }
        }

        outcome
    }

    /// Remove the source. Returns whether it went to the trash.
    fn delete(&self, source: &str) -> Result<bool, String> {
        let path = self.resolve(source)?;
        if !self.fs.exists(&path) {
            return Err("source does not exist".to_string());
        }
        if self.use_trash {
            self.fs
                .trash(&path)
                .map_err(|e| format!("could not move to trash: {e}"))?;
            Ok(true)
        } else {
            self.fs
                .remove_file(&path)
                .map_err(|e| format!("could not remove: {e}"))?;
            Ok(false)
        }
    }

    /// Move or archive `source` to `target`.
    ///
    /// Archive copies first and removes the source only after the copy
    /// succeeded. Returns the redirected target if a conflict was resolved
    /// by renaming.
    fn relocate(&self, source: &str, target: &str, archive: bool) -> Result<Option<String>, String> {
        let from = self.resolve(source)?;
        let planned = self.resolve(target)?;

        if !self.fs.exists(&from) {
            return Err("source does not exist".to_string());
        }

        let (to, redirected) = self.resolve_target(planned)?;

        if let Some(parent) = to.parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| format!("could not create {}: {e}", parent.display()))?;
        }

        if archive {
            if let Err(e) = self.fs.copy(&from, &to) {
                // The target did not exist before, so anything there now is a partial copy.
                if self.fs.exists(&to) {
                    if let Err(cleanup) = self.fs.remove_file(&to) {
                        tracing::warn!(
                            path = %to.display(),
                            "could not remove partial copy: {cleanup}"
                        );
                    }
                }
                return Err(format!("copy failed, source left in place: {e}"));
            }
            self.fs.remove_file(&from).map_err(|e| {
                format!("copied to {} but could not remove source: {e}", to.display())
            })?;
        } else {
            self.fs
                .rename(&from, &to)
                .map_err(|e| format!("rename failed: {e}"))?;
        }

        Ok(redirected.then(|| self.relative(&to)))
    }

    /// Apply the conflict policy to a planned target.
    fn resolve_target(&self, planned: PathBuf) -> Result<(PathBuf, bool), String> {
        if !self.fs.exists(&planned) {
            return Ok((planned, false));
        }
        match self.resolution {
            ConflictResolution::Fail => Err("target already exists".to_string()),
            ConflictResolution::AutoRename => {
                let renamed = auto_rename_path(self.fs.as_ref(), &planned);
                tracing::debug!(
                    planned = %planned.display(),
                    renamed = %renamed.display(),
                    "target exists, renaming"
                );
                Ok((renamed, true))
            }
        }
    }

    /// Resolve a plan path, refusing anything outside the root.
    fn resolve(&self, relative: &str) -> Result<PathBuf, String> {
        join_within(&self.root, relative).ok_or_else(|| ESCAPES_ROOT.to_string())
    }

    fn relative(&self, path: &Path) -> String {
        repotidy_core::normalize_path(path.strip_prefix(&self.root).unwrap_or(path))
    }
}
