//! Core types and rules for repotidy.
//!
//! This crate provides the data model shared by every stage of the
//! scan -> classify -> analyze -> plan -> apply pipeline: file records,
//! duplicate groups, cleanup actions and plans, plus the declarative
//! ruleset and the classifier that evaluates it.

mod classify;
mod config;
mod error;
mod file_set;
mod plan;
mod record;

pub use classify::{Classifier, RuleSet, RuleSetBuilder};
pub use config::{
    CONFIG_FILE_NAME, KeepPolicy, PlanConfig, PlanConfigBuilder, STATE_DIR, ScanConfig,
    ScanConfigBuilder, TidyConfig,
};
pub use error::{ConfigError, ScanError, ScanWarning, WarningKind};
pub use file_set::FileSet;
pub use plan::{
    CleanupAction, CleanupPlan, DuplicateGroup, PLAN_VERSION, PlanSummary, UnreferencedCandidate,
};
pub use record::{Category, ContentHash, FileRecord, ScannedFile, normalize_path};
