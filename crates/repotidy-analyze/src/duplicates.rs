//! Duplicate file detection by content hash.
//!
//! The walker already read every byte once to fingerprint it, so detection
//! is a single pass grouping records by hash. Two files end up in the same
//! group exactly when their hashes match.

use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use repotidy_core::{ContentHash, DuplicateGroup, FileRecord, FileSet, KeepPolicy, PlanConfig};

/// Configuration for duplicate detection.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct DuplicateConfig {
    /// Minimum file size to consider.
    #[builder(default = "0")]
    pub min_size: u64,

    /// Maximum number of groups to return (0 = unlimited).
    #[builder(default = "0")]
    pub max_groups: usize,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            min_size: 0,
            max_groups: 0,
        }
    }
}

impl DuplicateConfig {
    /// Create a new config builder.
    pub fn builder() -> DuplicateConfigBuilder {
        DuplicateConfigBuilder::default()
    }

    /// Take the duplicate thresholds from plan settings.
    pub fn from_plan_config(config: &PlanConfig) -> Self {
        Self {
            min_size: config.duplicate_min_size,
            max_groups: config.max_duplicate_groups,
        }
    }
}

/// Results from duplicate analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Groups sorted by wasted space descending, then first path.
    pub groups: Vec<DuplicateGroup>,

    /// Total wasted space (could be reclaimed).
    pub total_wasted_space: u64,

    /// Number of files analyzed.
    pub files_analyzed: u64,

    /// Number of files that have duplicates.
    pub files_with_duplicates: u64,

    /// Number of duplicate groups.
    pub group_count: usize,
}

impl DuplicateReport {
    /// Check if any duplicates were found.
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }

    /// Get total number of duplicate files across all groups.
    pub fn total_duplicate_files(&self) -> usize {
        self.groups.iter().map(|g| g.paths.len()).sum()
    }
}

/// Duplicate file finder.
pub struct DuplicateFinder {
    config: DuplicateConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with default config.
    pub fn new() -> Self {
        Self {
            config: DuplicateConfig::default(),
        }
    }

    /// Create a new duplicate finder with custom config.
    pub fn with_config(config: DuplicateConfig) -> Self {
        Self { config }
    }

    /// Find groups of byte-identical files.
    pub fn find_duplicates(&self, files: &FileSet) -> DuplicateReport {
        let candidates: Vec<&FileRecord> = files
            .records()
            .iter()
            .filter(|r| r.size >= self.config.min_size)
            .collect();
        let files_analyzed = candidates.len() as u64;

        let mut groups = group_by_hash(candidates);

        groups.sort_by(|a, b| {
            b.wasted_bytes()
                .cmp(&a.wasted_bytes())
                .then_with(|| a.paths.cmp(&b.paths))
        });

        if self.config.max_groups > 0 && groups.len() > self.config.max_groups {
            groups.truncate(self.config.max_groups);
        }

        let total_wasted_space = groups.iter().map(|g| g.wasted_bytes()).sum();
        let files_with_duplicates = groups.iter().map(|g| g.paths.len() as u64).sum();
        let group_count = groups.len();

        tracing::debug!(group_count, files_analyzed, "duplicate detection complete");

        DuplicateReport {
            groups,
            total_wasted_space,
            files_analyzed,
            files_with_duplicates,
            group_count,
        }
    }
}

impl Default for DuplicateFinder {
    fn default() -> Self {
        Self::new()
    }
}

/// Group records by hash, keeping only hashes shared by two or more files.
fn group_by_hash(records: Vec<&FileRecord>) -> Vec<DuplicateGroup> {
    let mut by_hash: IndexMap<ContentHash, Vec<&FileRecord>> = IndexMap::new();
    for record in records {
        by_hash.entry(record.content_hash).or_default().push(record);
    }

    by_hash
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|(hash, members)| {
            let mut paths: Vec<String> = members.iter().map(|r| r.path.clone()).collect();
            paths.sort();
            DuplicateGroup {
                hash,
                size: members[0].size,
                paths,
            }
        })
        .collect()
}

/// Split a group into the file to keep and the redundant rest.
///
/// Returns `None` if any member is missing from `files`.
pub fn split_group<'a>(
    group: &DuplicateGroup,
    files: &'a FileSet,
    policy: KeepPolicy,
) -> Option<(&'a FileRecord, Vec<&'a FileRecord>)> {
    let members: Vec<&FileRecord> = group
        .paths
        .iter()
        .map(|p| files.get(p))
        .collect::<Option<_>>()?;
    let keep = policy.select(&members)?;
    let rest = members.into_iter().filter(|r| r.path != keep.path).collect();
    Some((keep, rest))
}
