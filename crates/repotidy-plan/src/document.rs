//! Reading and writing plan artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use repotidy_core::{CleanupPlan, PLAN_VERSION, STATE_DIR};

use crate::error::PlanDocumentError;
use crate::report::render_report;

/// File name of the structured plan document.
pub const PLAN_FILE_NAME: &str = "plan.json";

/// File name of the markdown report.
pub const REPORT_FILE_NAME: &str = "report.md";

/// Where `plan` writes its document for a root.
pub fn default_plan_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(PLAN_FILE_NAME)
}

/// Where `plan` writes its report for a root.
pub fn default_report_path(root: &Path) -> PathBuf {
    root.join(STATE_DIR).join(REPORT_FILE_NAME)
}

/// Paths of the artifacts written by [`write_artifacts`].
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub plan_path: PathBuf,
    pub report_path: PathBuf,
}

/// Persist a plan as pretty-printed JSON, creating parent directories.
pub fn save_plan(plan: &CleanupPlan, path: &Path) -> Result<(), PlanDocumentError> {
    let json = serde_json::to_string_pretty(plan).map_err(|source| PlanDocumentError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_file(path, json.as_bytes())
}

/// Load a plan document.
///
/// Documents whose actions were trimmed or reordered by hand load fine; a
/// document from another format version is rejected.
pub fn load_plan(path: &Path) -> Result<CleanupPlan, PlanDocumentError> {
    let text = fs::read_to_string(path).map_err(|source| PlanDocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let plan: CleanupPlan =
        serde_json::from_str(&text).map_err(|source| PlanDocumentError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    if plan.version != PLAN_VERSION {
        return Err(PlanDocumentError::UnsupportedVersion {
            path: path.to_path_buf(),
            version: plan.version,
            expected: PLAN_VERSION,
        });
    }

    tracing::debug!(path = %path.display(), actions = plan.actions.len(), "plan loaded");
    Ok(plan)
}

/// Write the plan document and the markdown report under `<root>/.repotidy/`.
pub fn write_artifacts(plan: &CleanupPlan, root: &Path) -> Result<Artifacts, PlanDocumentError> {
    let plan_path = default_plan_path(root);
    let report_path = default_report_path(root);

    save_plan(plan, &plan_path)?;
    write_file(&report_path, render_report(plan).as_bytes())?;

    Ok(Artifacts {
        plan_path,
        report_path,
    })
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), PlanDocumentError> {
    let write_err = |source| PlanDocumentError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}
