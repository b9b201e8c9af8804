//! Cleanup plans for repotidy.
//!
//! This crate turns analyzer output into a [`CleanupPlan`], persists it as a
//! JSON document, and renders the human-readable markdown report. The plan
//! document is the only thing `apply` ever sees.
//!
//! ```rust,ignore
//! use repotidy_plan::{PlanBuilder, write_artifacts};
//!
//! let plan = PlanBuilder::new(&config.plan).plan(&files);
//! let artifacts = write_artifacts(&plan, &files.root)?;
//! println!("wrote {}", artifacts.plan_path.display());
//! ```

mod builder;
mod document;
mod error;
mod report;

pub use builder::{
    CONSOLIDATE_DOCS_REASON, DUPLICATE_DOCS_REASON, PlanBuilder, TEMP_FILE_REASON,
};
pub use document::{
    Artifacts, PLAN_FILE_NAME, REPORT_FILE_NAME, default_plan_path, default_report_path,
    load_plan, save_plan, write_artifacts,
};
pub use error::PlanDocumentError;
pub use report::render_report;

// Re-export core types
pub use repotidy_core::{CleanupAction, CleanupPlan, PlanSummary};
