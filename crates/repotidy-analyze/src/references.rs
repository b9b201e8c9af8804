//! Textual reference search.
//!
//! A candidate is unreferenced when no other file contains its name as a
//! byte substring. Aliased re-exports and dynamically built names produce
//! false negatives; short common names produce false positives. Results are
//! review candidates only.

use std::path::Path;

use memchr::memmem;
use rayon::prelude::*;

use repotidy_core::{Category, FileRecord, FileSet, PlanConfig, UnreferencedCandidate};

/// In-memory contents of every searchable file.
#[derive(Debug, Default)]
pub struct Corpus {
    entries: Vec<(String, Vec<u8>)>,
    skipped: usize,
}

impl Corpus {
    /// Read every record no larger than `max_file_size`.
    ///
    /// Files that cannot be read are skipped with a warning.
    pub fn load(files: &FileSet, max_file_size: u64) -> Self {
        let loaded: Vec<Option<(String, Vec<u8>)>> = files
            .records()
            .par_iter()
            .map(|record| {
                if record.size > max_file_size {
                    tracing::debug!(path = %record.path, size = record.size, "too large to search");
                    return None;
                }
                read_record(&files.root, record)
            })
            .collect();

        let total = loaded.len();
        let entries: Vec<(String, Vec<u8>)> = loaded.into_iter().flatten().collect();
        let skipped = total - entries.len();
        Self { entries, skipped }
    }

    /// Build a corpus from in-memory texts.
    pub fn from_texts<I, P, T>(texts: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: Into<Vec<u8>>,
    {
        Self {
            entries: texts
                .into_iter()
                .map(|(path, text)| (path.into(), text.into()))
                .collect(),
            skipped: 0,
        }
    }

    /// Whether any file other than `except` contains `needle`.
    pub fn mentions(&self, needle: &str, except: &str) -> bool {
        let finder = memmem::Finder::new(needle.as_bytes());
        self.entries
            .iter()
            .filter(|(path, _)| path != except)
            .any(|(_, bytes)| finder.find(bytes).is_some())
    }

    /// Number of files held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files left out (too large or unreadable).
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

fn read_record(root: &Path, record: &FileRecord) -> Option<(String, Vec<u8>)> {
    match std::fs::read(root.join(&record.path)) {
        Ok(bytes) => Some((record.path.clone(), bytes)),
        Err(err) => {
            tracing::warn!(path = %record.path, "not searched for references: {err}");
            None
        }
    }
}

/// Results of reference analysis.
#[derive(Debug, Clone, Default)]
pub struct ReferenceReport {
    /// Component sources whose bare name is never mentioned.
    pub unreferenced_components: Vec<UnreferencedCandidate>,
    /// Assets whose file name is never mentioned.
    pub unused_assets: Vec<UnreferencedCandidate>,
    /// Files searched.
    pub corpus_files: usize,
    /// Files too large or unreadable to search.
    pub skipped_files: usize,
}

/// Heuristic reference analyzer.
#[derive(Debug, Clone)]
pub struct ReferenceAnalyzer {
    component_dirs: Vec<String>,
    max_file_size: u64,
}

impl ReferenceAnalyzer {
    /// Create an analyzer for the given component directory names.
    pub fn new(component_dirs: Vec<String>, max_file_size: u64) -> Self {
        Self {
            component_dirs,
            max_file_size,
        }
    }

    /// Create an analyzer from plan settings.
    pub fn from_plan_config(config: &PlanConfig) -> Self {
        Self::new(config.component_dirs.clone(), config.max_reference_file_size)
    }

    /// Whether a record is a component candidate.
    pub fn is_component(&self, record: &FileRecord) -> bool {
        record.category == Category::Source
            && record.parent().is_some_and(|parent| {
                parent
                    .split('/')
                    .any(|segment| self.component_dirs.iter().any(|d| d == segment))
            })
    }

    /// Read the tree and search for every candidate.
    pub fn analyze(&self, files: &FileSet) -> ReferenceReport {
        let corpus = Corpus::load(files, self.max_file_size);
        self.analyze_with(files, &corpus)
    }

    /// Search a preloaded corpus.
    pub fn analyze_with(&self, files: &FileSet, corpus: &Corpus) -> ReferenceReport {
        let components: Vec<(&FileRecord, &str)> = files
            .records()
            .iter()
            .filter(|r| self.is_component(r))
            .map(|r| (r, r.stem()))
            .collect();

        let assets: Vec<(&FileRecord, &str)> = files
            .in_category(Category::Assets)
            .map(|r| (r, r.file_name()))
            .collect();

        let report = ReferenceReport {
            unreferenced_components: find_unreferenced(corpus, &components),
            unused_assets: find_unreferenced(corpus, &assets),
            corpus_files: corpus.len(),
            skipped_files: corpus.skipped(),
        };

        tracing::debug!(
            components = components.len(),
            unreferenced = report.unreferenced_components.len(),
            assets = assets.len(),
            unused_assets = report.unused_assets.len(),
            "reference analysis complete"
        );

        report
    }
}

impl Default for ReferenceAnalyzer {
    fn default() -> Self {
        Self::from_plan_config(&PlanConfig::default())
    }
}

/// Check candidates in parallel against the shared read-only corpus.
fn find_unreferenced(corpus: &Corpus, candidates: &[(&FileRecord, &str)]) -> Vec<UnreferencedCandidate> {
    let mut found: Vec<UnreferencedCandidate> = candidates
        .par_iter()
        .filter(|(_, name)| !name.is_empty())
        .filter(|(record, name)| !corpus.mentions(name, &record.path))
        .map(|(record, name)| UnreferencedCandidate {
            path: record.path.clone(),
            name: name.to_string(),
        })
        .collect();
    found.sort();
    found
}
