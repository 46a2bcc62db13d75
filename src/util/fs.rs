//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Remove a directory and all its contents, if it exists.
///
/// Returns `true` if the directory existed and was removed.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
        return Ok(true);
    }
    Ok(false)
}

/// Get the relative path from `base` to `path`, for display.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_dir_all_if_exists() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("artifacts");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/file"), "x").unwrap();

        assert!(remove_dir_all_if_exists(&dir).unwrap());
        assert!(!dir.exists());

        // Removing again is a no-op.
        assert!(!remove_dir_all_if_exists(&dir).unwrap());
    }

    #[test]
    fn test_ensure_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a/b/c");

        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());

        ensure_dir(&dir).unwrap();
    }

    #[test]
    fn test_relative_path() {
        let rel = relative_path(Path::new("/ws"), Path::new("/ws/build/pkg"));
        assert_eq!(rel, PathBuf::from("build/pkg"));
    }
}
