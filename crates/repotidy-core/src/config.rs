//! Scan, plan and file-level configuration.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::classify::RuleSet;
use crate::error::ConfigError;
use crate::record::FileRecord;

/// Directory under the scan root that holds plan artifacts and the archive.
pub const STATE_DIR: &str = ".repotidy";

/// Name of the optional config file looked up at the scan root.
pub const CONFIG_FILE_NAME: &str = "repotidy.toml";

/// Configuration for the tree walker.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Directory names whose subtrees are skipped (exact name match).
    #[builder(default = "default_excluded_dirs()")]
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Number of hashing threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,
}

fn default_excluded_dirs() -> Vec<String> {
    vec![
        ".git".to_string(),
        "node_modules".to_string(),
        STATE_DIR.to_string(),
    ]
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded_dirs: default_excluded_dirs(),
            follow_symlinks: false,
            threads: 0,
        }
    }

    /// Check if a directory name is excluded.
    pub fn is_excluded(&self, dir_name: &str) -> bool {
        self.excluded_dirs.iter().any(|d| d == dir_name)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Which member of a duplicate group survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeepPolicy {
    /// Lexicographically smallest path.
    #[default]
    SmallestPath,
    /// Fewest characters, then smallest path.
    ShortestPath,
    /// Most recently modified, then smallest path.
    Newest,
    /// Least recently modified, then smallest path.
    Oldest,
}

impl KeepPolicy {
    /// Pick the file to keep. Deterministic for a given set of members.
    pub fn select<'a>(&self, members: &[&'a FileRecord]) -> Option<&'a FileRecord> {
        let by_path = |a: &&FileRecord, b: &&FileRecord| a.path.cmp(&b.path);
        match self {
            Self::SmallestPath => members.iter().copied().min_by(by_path),
            Self::ShortestPath => members
                .iter()
                .copied()
                .min_by(|a, b| a.path.len().cmp(&b.path.len()).then_with(|| by_path(a, b))),
            Self::Newest => members.iter().copied().min_by(|a, b| {
                b.last_modified
                    .cmp(&a.last_modified)
                    .then_with(|| by_path(a, b))
            }),
            Self::Oldest => members.iter().copied().min_by(|a, b| {
                a.last_modified
                    .cmp(&b.last_modified)
                    .then_with(|| by_path(a, b))
            }),
        }
    }
}

/// Configuration for the analyzers and plan builder.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
#[serde(default)]
pub struct PlanConfig {
    /// Archive root, relative to the scan root.
    #[builder(default = "default_archive_dir()")]
    pub archive_dir: String,

    /// Subdirectory of the archive for duplicate documentation.
    #[builder(default = "\"duplicates\".to_string()")]
    pub duplicates_subdir: String,

    /// Subdirectory of the archive for consolidated index/readme files.
    #[builder(default = "\"docs\".to_string()")]
    pub docs_subdir: String,

    /// Directory names whose source files are reference-checked.
    #[builder(default = "default_component_dirs()")]
    pub component_dirs: Vec<String>,

    /// File stems treated as index/readme docs (case-insensitive).
    #[builder(default = "default_index_names()")]
    pub index_names: Vec<String>,

    /// Which duplicate survives.
    #[builder(default)]
    pub keep_policy: KeepPolicy,

    /// Files larger than this are not searched for references.
    #[builder(default = "2 * 1024 * 1024")]
    pub max_reference_file_size: u64,

    /// Files smaller than this are never reported as duplicates.
    #[builder(default = "0")]
    pub duplicate_min_size: u64,

    /// Keep only the most wasteful duplicate groups (0 = all).
    #[builder(default = "0")]
    pub max_duplicate_groups: usize,
}

fn default_archive_dir() -> String {
    format!("{STATE_DIR}/archive")
}

fn default_component_dirs() -> Vec<String> {
    vec!["components".to_string(), "packages".to_string()]
}

fn default_index_names() -> Vec<String> {
    vec!["readme".to_string(), "index".to_string()]
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            archive_dir: default_archive_dir(),
            duplicates_subdir: "duplicates".to_string(),
            docs_subdir: "docs".to_string(),
            component_dirs: default_component_dirs(),
            index_names: default_index_names(),
            keep_policy: KeepPolicy::default(),
            max_reference_file_size: 2 * 1024 * 1024,
            duplicate_min_size: 0,
            max_duplicate_groups: 0,
        }
    }
}

impl PlanConfig {
    /// Create a new plan config builder.
    pub fn builder() -> PlanConfigBuilder {
        PlanConfigBuilder::default()
    }

    /// Archive location for a duplicate doc.
    pub fn duplicate_target(&self, source: &str) -> String {
        format!("{}/{}/{}", self.archive_dir, self.duplicates_subdir, source)
    }

    /// Archive directory for consolidated docs.
    pub fn docs_archive(&self) -> String {
        format!("{}/{}", self.archive_dir, self.docs_subdir)
    }
}

/// File-level configuration, as read from `repotidy.toml`.
///
/// The scan root is not part of the file; it always comes from the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TidyConfig {
    /// Extra directory names to exclude on top of the defaults.
    pub exclude: Vec<String>,
    /// Hashing threads (0 = auto).
    pub threads: usize,
    /// Classification tables.
    pub rules: RuleSet,
    /// Analyzer and builder settings.
    pub plan: PlanConfig,
}

impl TidyConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Load `explicit` if given, else `<root>/repotidy.toml` if present, else defaults.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "loading config");
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Build the walker config for a root.
    pub fn scan_config(&self, root: impl Into<PathBuf>) -> ScanConfig {
        let mut config = ScanConfig::new(root);
        for dir in &self.exclude {
            if !config.is_excluded(dir) {
                config.excluded_dirs.push(dir.clone());
            }
        }
        config.threads = self.threads;
        config
    }
}
