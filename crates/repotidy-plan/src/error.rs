//! Plan document errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reading or writing plan artifacts.
#[derive(Debug, Error)]
pub enum PlanDocumentError {
    /// The document could not be read.
    #[error("Failed to read plan {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact could not be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not a valid plan.
    #[error("Invalid plan document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document was written by an incompatible version.
    #[error("Unsupported plan version {version} in {path} (expected {expected})")]
    UnsupportedVersion {
        path: PathBuf,
        version: u32,
        expected: u32,
    },
}
