//! Tree walker for repotidy.
//!
//! This crate enumerates every regular file under a root, skipping excluded
//! directory names, and fingerprints each file with a single full read.
//!
//! # Overview
//!
//! - **Parallel traversal** via jwalk
//! - **Bounded hashing pool** via rayon (`ScanConfig::threads`)
//! - **Progress updates** via broadcast channels
//! - **Non-fatal errors**: unreadable directories and files become warnings
//!
//! # Example
//!
//! ```rust,no_run
//! use repotidy_scan::{Classifier, RuleSet, ScanConfig, TreeWalker};
//!
//! let config = ScanConfig::new("/path/to/repo");
//! let classifier = Classifier::new(RuleSet::default()).unwrap();
//! let files = TreeWalker::new().scan(&config, &classifier).unwrap();
//!
//! println!("Total files: {}", files.len());
//! println!("Total size: {} bytes", files.total_bytes());
//! ```

mod hash;
mod progress;
mod walker;

pub use hash::hash_file;
pub use progress::ScanProgress;
pub use walker::{TreeWalker, WalkOutput};

// Re-export core types for convenience
pub use repotidy_core::{
    Classifier, FileRecord, FileSet, RuleSet, ScanConfig, ScanError, ScanWarning, ScannedFile,
    WarningKind,
};
