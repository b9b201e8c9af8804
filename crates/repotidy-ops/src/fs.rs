//! The narrow filesystem interface the executor mutates through.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Failure reason for a plan path that does not stay under the root.
pub const ESCAPES_ROOT: &str = "path escapes root";

/// Join a plan-relative path onto `root`.
///
/// Returns `None` for absolute paths and for any path with a `..`, root or
/// prefix component, so the result is always inside `root`.
pub fn join_within(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    let contained = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    (contained && !relative.as_os_str().is_empty()).then(|| root.join(relative))
}

/// Filesystem capabilities needed to apply and revert plans.
pub trait FileSystem: Send + Sync {
    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Rename a file.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Copy file contents, returning the number of bytes written.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Unlink a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Send a file to the platform trash.
    fn trash(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        std::fs::copy(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn trash(&self, path: &Path) -> io::Result<()> {
        trash::delete(path).map_err(|e| io::Error::other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_std_filesystem_basics() {
        let temp = TempDir::new().unwrap();
        let fs = StdFileSystem;
        let a = temp.path().join("a.txt");
        let b = temp.path().join("nested/dir/b.txt");

        std::fs::write(&a, "hello").unwrap();
        assert!(fs.exists(&a));

        fs.create_dir_all(b.parent().unwrap()).unwrap();
        assert_eq!(fs.copy(&a, &b).unwrap(), 5);
        fs.remove_file(&a).unwrap();
        assert!(!fs.exists(&a));

        fs.rename(&b, &a).unwrap();
        assert_eq!(std::fs::read_to_string(&a).unwrap(), "hello");
    }

    #[test]
    fn test_join_within_rejects_escapes() {
        let root = Path::new("/repo");
        assert_eq!(
            join_within(root, "docs/a.md"),
            Some(PathBuf::from("/repo/docs/a.md"))
        );
        assert_eq!(
            join_within(root, "./docs/a.md"),
            Some(PathBuf::from("/repo/docs/a.md"))
        );
        assert_eq!(join_within(root, "../victim.txt"), None);
        assert_eq!(join_within(root, "docs/../../victim.txt"), None);
        assert_eq!(join_within(root, "/etc/passwd"), None);
        assert_eq!(join_within(root, ""), None);
    }
}
