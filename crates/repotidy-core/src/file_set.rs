//! Classified scan result container.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::Classifier;
use crate::error::ScanWarning;
use crate::record::{Category, FileRecord, ScannedFile};

/// Every classified file under a root, sorted by path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "UnsortedFileSet")]
pub struct FileSet {
    /// Absolute root that was scanned.
    pub root: PathBuf,

    /// Sorted by path; [`FileSet::get`] binary-searches it.
    records: Vec<FileRecord>,

    /// When this scan was performed.
    pub scanned_at: DateTime<Utc>,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Warnings encountered during scan.
    pub warnings: Vec<ScanWarning>,
}

/// Deserialized form, sorted on conversion.
#[derive(Deserialize)]
struct UnsortedFileSet {
    root: PathBuf,
    records: Vec<FileRecord>,
    scanned_at: DateTime<Utc>,
    scan_duration: Duration,
    warnings: Vec<ScanWarning>,
}

impl From<UnsortedFileSet> for FileSet {
    fn from(raw: UnsortedFileSet) -> Self {
        let mut records = raw.records;
        records.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            root: raw.root,
            records,
            scanned_at: raw.scanned_at,
            scan_duration: raw.scan_duration,
            warnings: raw.warnings,
        }
    }
}

impl FileSet {
    /// Classify walker output into a file set.
    pub fn classify(
        root: PathBuf,
        files: Vec<ScannedFile>,
        warnings: Vec<ScanWarning>,
        scan_duration: Duration,
        classifier: &Classifier,
    ) -> Self {
        let mut records: Vec<FileRecord> = files
            .into_iter()
            .map(|file| {
                let category = classifier.classify(&file.path);
                file.into_record(category)
            })
            .collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));

        Self {
            root,
            records,
            scanned_at: Utc::now(),
            scan_duration,
            warnings,
        }
    }

    /// Build a set directly from records, e.g. in tests.
    pub fn from_records(root: impl Into<PathBuf>, mut records: Vec<FileRecord>) -> Self {
        records.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            root: root.into(),
            records,
            scanned_at: Utc::now(),
            scan_duration: Duration::ZERO,
            warnings: Vec::new(),
        }
    }

    /// All records, sorted by path.
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Look up a record by relative path.
    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.records
            .binary_search_by(|r| r.path.as_str().cmp(path))
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Records of one category.
    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(move |r| r.category == category)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no files were found.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total bytes across all files.
    pub fn total_bytes(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }

    /// File count per category.
    pub fn category_counts(&self) -> BTreeMap<Category, u64> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.category).or_insert(0) += 1;
        }
        counts
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
