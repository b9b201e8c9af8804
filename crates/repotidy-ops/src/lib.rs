//! Plan execution for repotidy.
//!
//! The executor replays a persisted [`CleanupPlan`] against the filesystem.
//! Every action is attempted independently: a failure is recorded as that
//! action's outcome and the batch moves on. Applied moves and archives are
//! written to a journal so a run can be reverted.
//!
//! All filesystem access goes through the [`FileSystem`] trait.
//!
//! ```rust,ignore
//! use repotidy_ops::PlanExecutor;
//!
//! let report = PlanExecutor::new(&plan.root).apply(&plan);
//! println!("{}", report.summary());
//! ```

mod conflict;
mod error;
mod executor;
mod fs;
mod journal;
mod outcome;
mod verify;

pub use conflict::{ConflictResolution, auto_rename_path};
pub use error::{JournalError, OperationError};
pub use executor::PlanExecutor;
pub use fs::{ESCAPES_ROOT, FileSystem, StdFileSystem, join_within};
pub use journal::{
    JOURNAL_FILE_NAME, Journal, JournalEntry, RevertReport, UndoableChange, default_journal_path,
    revert,
};
pub use outcome::{ActionOutcome, ActionState, ApplyEvent, ApplyReport};
pub use verify::{VerifyIssue, VerifyReport, verify_plan};

// Re-export core types
pub use repotidy_core::{CleanupAction, CleanupPlan};

/// Default channel buffer size for apply events.
pub const APPLY_CHANNEL_SIZE: usize = 100;
