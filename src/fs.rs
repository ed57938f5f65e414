//! Atomic filesystem operations for bosun.
//!
//! Issue records are patched in place by the reconciler; a crash mid-write
//! must never leave a record truncated. All writes go through a
//! write-temp-then-rename sequence:
//!
//! 1. Write content to a temporary file in the same directory
//! 2. Sync the file to disk (fsync)
//! 3. Atomically rename over the original file
//!
//! Source and destination live in the same directory, so the rename is atomic
//! on POSIX filesystems. On crash, a `.{filename}.tmp` file may remain.

use crate::error::{BosunError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write a string to a file.
///
/// Writes the content to a temporary sibling file, syncs it, then renames it
/// over the target so the target is never observed in a partial state.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            BosunError::RecordError(format!(
                "failed to create parent directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = temp_path_for(path)?;
    write_and_sync(&temp_path, content.as_bytes())?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        BosunError::RecordError(format!(
            "failed to replace '{}' atomically: {}",
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Temporary file path in the same directory as the target.
fn temp_path_for(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BosunError::RecordError("invalid file path".to_string()))?;

    Ok(parent.join(format!(".{}.tmp", filename)))
}

/// Write content to a file and sync it to disk.
fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        BosunError::RecordError(format!(
            "failed to create temporary file '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.write_all(content)
        .and_then(|_| file.sync_all())
        .map_err(|e| {
            let _ = fs::remove_file(path);
            BosunError::RecordError(format!(
                "failed to write temporary file '{}': {}",
                path.display(),
                e
            ))
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("record.json");

        atomic_write_file(&path, "{\"id\":\"a\"}\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"id\":\"a\"}\n");
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("record.json");

        fs::write(&path, "old").unwrap();
        atomic_write_file(&path, "new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("record.json");

        atomic_write_file(&path, "content").unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], "record.json");
    }

    #[test]
    fn test_atomic_write_creates_missing_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/record.json");

        atomic_write_file(&path, "content").unwrap();

        assert!(path.exists());
    }
}
