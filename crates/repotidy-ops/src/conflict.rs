//! Target conflict handling for move and archive actions.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::fs::FileSystem;

/// What to do when a move or archive target already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictResolution {
    /// Report the action as failed and leave both files alone.
    #[default]
    Fail,
    /// Redirect to a free name such as "file (1).txt".
    AutoRename,
}

/// Generate a free path next to `path`.
///
/// For "file.txt", tries "file (1).txt", "file (2).txt", etc.
pub fn auto_rename_path(fs: &dyn FileSystem, path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = path.file_stem().unwrap_or_default();
    let extension = path.extension();

    // Built as OsString so non-UTF-8 names survive unchanged.
    let name_with = |suffix: &str| {
        let mut name = stem.to_os_string();
        name.push(suffix);
        if let Some(ext) = extension {
            name.push(".");
            name.push(ext);
        }
        name
    };

    for i in 1..1000 {
        let candidate = parent.join(name_with(&format!(" ({i})")));
        if !fs.exists(&candidate) {
            return candidate;
        }
    }

    // Fallback: use timestamp
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    parent.join(name_with(&format!("_{timestamp}")))
}
