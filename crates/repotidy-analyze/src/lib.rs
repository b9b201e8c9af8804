//! Redundancy analyzers for repotidy.
//!
//! Both analyzers consume an already classified [`FileSet`]:
//!
//! - **Duplicate detection** - group files by their BLAKE3 content hash
//!   (computed once by the walker, so grouping is a single linear pass)
//! - **Reference analysis** - flag component sources and assets whose name
//!   never appears in any other file
//!
//! Reference analysis is a textual heuristic. Its output is a list of
//! [`UnreferencedCandidate`]s for human review; there is deliberately no
//! path from a candidate to a cleanup action.
//!
//! ```rust,ignore
//! use repotidy_analyze::{DuplicateFinder, ReferenceAnalyzer};
//!
//! let report = DuplicateFinder::new().find_duplicates(&files);
//! println!("Found {} duplicate groups", report.group_count);
//!
//! let refs = ReferenceAnalyzer::default().analyze(&files);
//! for candidate in &refs.unreferenced_components {
//!     println!("review: {} ({})", candidate.path, candidate.name);
//! }
//! ```

mod duplicates;
mod references;

pub use duplicates::{
    DuplicateConfig, DuplicateConfigBuilder, DuplicateFinder, DuplicateReport, split_group,
};
pub use references::{Corpus, ReferenceAnalyzer, ReferenceReport};

// Re-export core types
pub use repotidy_core::{DuplicateGroup, FileRecord, FileSet, KeepPolicy, UnreferencedCandidate};
