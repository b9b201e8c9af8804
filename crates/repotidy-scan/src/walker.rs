//! JWalk-based tree walker with a rayon hashing pool.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use tokio::sync::broadcast;

use repotidy_core::{
    Classifier, FileSet, ScanConfig, ScanError, ScanWarning, ScannedFile, WarningKind,
    normalize_path,
};

use crate::hash::hash_file;
use crate::progress::ScanProgress;

/// Send a progress snapshot every this many hashed files.
const PROGRESS_INTERVAL: u64 = 256;

/// Unclassified walker output.
#[derive(Debug)]
pub struct WalkOutput {
    /// Canonical root.
    pub root: PathBuf,
    /// Hashed files sorted by relative path.
    pub files: Vec<ScannedFile>,
    /// Directories and files that could not be read.
    pub warnings: Vec<ScanWarning>,
    /// Wall time of listing plus hashing.
    pub duration: Duration,
}

/// Recursive file walker. Never modifies the filesystem.
pub struct TreeWalker {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl TreeWalker {
    /// Create a new walker.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Walk and classify in one call.
    pub fn scan(&self, config: &ScanConfig, classifier: &Classifier) -> Result<FileSet, ScanError> {
        let output = self.walk(config)?;
        Ok(FileSet::classify(
            output.root,
            output.files,
            output.warnings,
            output.duration,
            classifier,
        ))
    }

    /// List and hash every regular file under the configured root.
    ///
    /// Only an inaccessible root is fatal; anything below it that cannot be
    /// read is recorded as a warning and skipped.
    pub fn walk(&self, config: &ScanConfig) -> Result<WalkOutput, ScanError> {
        let start = Instant::now();
        let root = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }
        std::fs::read_dir(&root).map_err(|e| ScanError::io(&root, e))?;

        let mut warnings = Vec::new();
        let paths = self.list_files(config, &root, &mut warnings);
        tracing::debug!(files = paths.len(), "listing complete");

        let results = self.hash_all(config, &root, &paths, start)?;

        let mut files = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(file) => files.push(file),
                Err(warning) => {
                    tracing::warn!(path = %warning.path.display(), "{}", warning.message);
                    warnings.push(warning);
                }
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let duration = start.elapsed();
        tracing::debug!(
            files = files.len(),
            warnings = warnings.len(),
            elapsed_ms = duration.as_millis() as u64,
            "scan complete"
        );

        Ok(WalkOutput {
            root,
            files,
            warnings,
            duration,
        })
    }

    /// Collect regular file paths, pruning excluded directories.
    fn list_files(
        &self,
        config: &ScanConfig,
        root: &Path,
        warnings: &mut Vec<ScanWarning>,
    ) -> Vec<PathBuf> {
        let parallelism = match config.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let excluded: HashSet<String> = config.excluded_dirs.iter().cloned().collect();

        let walker = WalkDir::new(root)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(config.follow_symlinks)
            .process_read_dir(move |_depth, _path, _state, children| {
                children.retain(|entry| match entry {
                    Ok(e) => {
                        !(e.file_type().is_dir()
                            && excluded.contains(e.file_name().to_string_lossy().as_ref()))
                    }
                    Err(_) => true,
                });
            });

        let mut paths = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    tracing::warn!(path = %path.display(), "skipping unreadable entry: {err}");
                    warnings.push(ScanWarning::new(
                        path,
                        err.to_string(),
                        WarningKind::ReadDirError,
                    ));
                    continue;
                }
            };

            if let Some(err) = &entry.read_children_error {
                let path = entry.path();
                tracing::warn!(path = %path.display(), "skipping unreadable directory: {err}");
                warnings.push(ScanWarning::new(
                    path,
                    err.to_string(),
                    WarningKind::ReadDirError,
                ));
            }

            if entry.file_type().is_file() {
                paths.push(entry.path());
            }
        }

        paths
    }

    /// Hash files on the configured pool.
    fn hash_all(
        &self,
        config: &ScanConfig,
        root: &Path,
        paths: &[PathBuf],
        start: Instant,
    ) -> Result<Vec<Result<ScannedFile, ScanWarning>>, ScanError> {
        let files_found = paths.len() as u64;
        let hashed = AtomicU64::new(0);
        let bytes = AtomicU64::new(0);
        let errors = AtomicU64::new(0);

        let work = || {
            paths
                .par_iter()
                .map(|path| {
                    let result = hash_one(root, path);
                    match &result {
                        Ok(file) => {
                            bytes.fetch_add(file.size, Ordering::Relaxed);
                        }
                        Err(_) => {
                            errors.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    let count = hashed.fetch_add(1, Ordering::Relaxed) + 1;
                    if count % PROGRESS_INTERVAL == 0 || count == files_found {
                        let _ = self.progress_tx.send(ScanProgress {
                            files_found,
                            files_hashed: count,
                            bytes_hashed: bytes.load(Ordering::Relaxed),
                            current_path: path.clone(),
                            errors_count: errors.load(Ordering::Relaxed),
                            elapsed: start.elapsed(),
                        });
                    }
                    result
                })
                .collect::<Vec<_>>()
        };

        if config.threads == 0 {
            return Ok(work());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()
            .map_err(|e| ScanError::WorkerPool {
                message: e.to_string(),
            })?;
        Ok(pool.install(work))
    }
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new()
    }
}

/// Read and fingerprint one file.
fn hash_one(root: &Path, path: &Path) -> Result<ScannedFile, ScanWarning> {
    let (size, content_hash) = hash_file(path).map_err(|e| ScanWarning::read_error(path, &e))?;

    let last_modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(std::time::UNIX_EPOCH);

    let relative = path.strip_prefix(root).unwrap_or(path);

    Ok(ScannedFile {
        path: normalize_path(relative),
        size,
        content_hash,
        last_modified: DateTime::<Utc>::from(last_modified),
    })
}
