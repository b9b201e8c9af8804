//! Per-action outcomes and apply events.

use serde::{Deserialize, Serialize};

use repotidy_core::CleanupAction;

/// Lifecycle of one action: `pending -> applied | failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ActionState {
    Pending,
    Applied,
    Failed { reason: String },
}

impl ActionState {
    /// Whether the action reached a final state.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// What happened to one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    /// Position in the plan's action list.
    pub index: usize,
    /// The action as it appeared in the plan.
    pub action: CleanupAction,
    /// Final state.
    #[serde(flatten)]
    pub state: ActionState,
    /// Where the file ended up, if a conflict redirected it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirected_to: Option<String>,
    /// Whether a delete went to the trash.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub trashed: bool,
}

impl ActionOutcome {
    /// A fresh, not yet attempted outcome.
    pub fn pending(index: usize, action: CleanupAction) -> Self {
        Self {
            index,
            action,
            state: ActionState::Pending,
            redirected_to: None,
            trashed: false,
        }
    }

    /// Whether the action was applied.
    pub fn is_applied(&self) -> bool {
        self.state == ActionState::Applied
    }

    /// The failure reason, if any.
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            ActionState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// The target the file actually landed at.
    pub fn final_target(&self) -> Option<&str> {
        self.redirected_to.as_deref().or(self.action.target())
    }

    /// One log line: `applied <action>` or `failed <action>: <reason>`.
    pub fn log_line(&self) -> String {
        match &self.state {
            ActionState::Pending => format!("pending {}", self.action),
            ActionState::Applied => match &self.redirected_to {
                Some(target) => format!("applied {} (as {target})", self.action),
                None => format!("applied {}", self.action),
            },
            ActionState::Failed { reason } => format!("failed {}: {reason}", self.action),
        }
    }
}

/// Tally of a whole apply run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Number of applied actions.
    pub applied: usize,
    /// Number of failed actions.
    pub failed: usize,
    /// Number of actions attempted.
    pub total: usize,
    /// One outcome per action, in plan order.
    pub outcomes: Vec<ActionOutcome>,
}

impl ApplyReport {
    /// Build the tally from finished outcomes.
    pub fn from_outcomes(outcomes: Vec<ActionOutcome>) -> Self {
        let applied = outcomes.iter().filter(|o| o.is_applied()).count();
        let failed = outcomes.iter().filter(|o| o.failure().is_some()).count();
        Self {
            applied,
            failed,
            total: outcomes.len(),
            outcomes,
        }
    }

    /// Check if every action was applied.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Get a human-readable summary of the run.
    pub fn summary(&self) -> String {
        format!(
            "{} applied, {} failed, {} total",
            self.applied, self.failed, self.total
        )
    }
}

/// Event sent through the channel during a streaming apply.
#[derive(Debug, Clone)]
pub enum ApplyEvent {
    /// The run started.
    Started { total: usize },
    /// One action finished.
    Outcome(ActionOutcome),
    /// The run finished.
    Complete(ApplyReport),
}
