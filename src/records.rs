//! Keyed issue record store.
//!
//! Issue records live as `<id>.json` files in a single directory. The
//! reconciler only ever touches the `created_at`/`updated_at` fields; every
//! other field passes through unexamined (merge-patch, not overwrite), and
//! writes are atomic with a trailing newline.

use crate::error::{BosunError, Result};
use crate::fs::atomic_write_file;
use chrono::{DateTime, Local};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Directory of JSON issue records, keyed by issue id.
#[derive(Debug)]
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Open a record store rooted at `dir`.
    ///
    /// A missing directory is a configuration failure: without records there
    /// is no meaningful reconciliation work.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(BosunError::ConfigError(format!(
                "issues directory not found at '{}'",
                dir.display()
            )));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Paths of all `.json` records, sorted by file name for deterministic
    /// processing order.
    pub fn record_paths(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            BosunError::RecordError(format!(
                "failed to list issues directory '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        Ok(paths)
    }

    /// Load one record as a JSON object.
    pub fn load(&self, path: &Path) -> Result<Value> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BosunError::RecordError(format!("failed to read '{}': {}", path.display(), e))
        })?;

        let value: Value = serde_json::from_str(&content).map_err(|e| {
            BosunError::RecordError(format!("failed to parse '{}': {}", path.display(), e))
        })?;

        if !value.is_object() {
            return Err(BosunError::RecordError(format!(
                "'{}' is not a JSON object",
                path.display()
            )));
        }

        Ok(value)
    }

    /// Write the timestamp fields into a record and persist it.
    ///
    /// The record is rewritten from the in-memory object, so unrelated
    /// fields survive untouched.
    pub fn patch_timestamps(
        &self,
        path: &Path,
        mut record: Value,
        created_at: &str,
        updated_at: &str,
    ) -> Result<()> {
        let object = record
            .as_object_mut()
            .ok_or_else(|| BosunError::Internal("record is not an object".to_string()))?;

        object.insert(
            "created_at".to_string(),
            Value::String(created_at.to_string()),
        );
        object.insert(
            "updated_at".to_string(),
            Value::String(updated_at.to_string()),
        );

        let json = serde_json::to_string_pretty(&record).map_err(|e| {
            BosunError::RecordError(format!("failed to serialize '{}': {}", path.display(), e))
        })?;

        atomic_write_file(path, &format!("{}\n", json))
    }

    /// The record's last-modified time as a local fixed-offset RFC 3339
    /// string. Fallback timestamp source when an issue has no events.
    pub fn modified_rfc3339(&self, path: &Path) -> Result<String> {
        let modified = std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|e| {
                BosunError::RecordError(format!(
                    "failed to read mtime of '{}': {}",
                    path.display(),
                    e
                ))
            })?;

        let dt: DateTime<Local> = modified.into();
        Ok(dt.to_rfc3339())
    }
}

/// The `id` field of a record, if present and a string.
pub fn issue_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// A timestamp field of a record, if present and a string.
pub fn timestamp_field<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_record(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_open_missing_dir_is_config_error() {
        let dir = TempDir::new().unwrap();

        let err = RecordStore::open(&dir.path().join("missing")).unwrap_err();

        assert_eq!(err.exit_code(), crate::exit_codes::CONFIG_FAILURE);
    }

    #[test]
    fn test_record_paths_sorted_json_only() {
        let dir = TempDir::new().unwrap();
        write_record(&dir, "b.json", &json!({"id": "b"}));
        write_record(&dir, "a.json", &json!({"id": "a"}));
        std::fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();

        let store = RecordStore::open(dir.path()).unwrap();
        let paths = store.record_paths().unwrap();

        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_patch_preserves_unrelated_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_record(
            &dir,
            "a.json",
            &json!({
                "id": "a",
                "title": "Fix the widget",
                "state": "ready",
                "tags": ["bug", "ui"],
            }),
        );

        let store = RecordStore::open(dir.path()).unwrap();
        let record = store.load(&path).unwrap();
        store
            .patch_timestamps(
                &path,
                record,
                "2024-01-01T10:00:00+00:00",
                "2024-01-02T10:00:00+00:00",
            )
            .unwrap();

        let reloaded = store.load(&path).unwrap();
        assert_eq!(reloaded["title"], "Fix the widget");
        assert_eq!(reloaded["state"], "ready");
        assert_eq!(reloaded["tags"], json!(["bug", "ui"]));
        assert_eq!(reloaded["created_at"], "2024-01-01T10:00:00+00:00");
        assert_eq!(reloaded["updated_at"], "2024-01-02T10:00:00+00:00");
    }

    #[test]
    fn test_patched_record_ends_with_newline() {
        let dir = TempDir::new().unwrap();
        let path = write_record(&dir, "a.json", &json!({"id": "a"}));

        let store = RecordStore::open(dir.path()).unwrap();
        let record = store.load(&path).unwrap();
        store.patch_timestamps(&path, record, "t0", "t1").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_load_rejects_non_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let store = RecordStore::open(dir.path()).unwrap();
        let err = store.load(&path).unwrap_err();

        assert!(err.to_string().contains("not a JSON object"));
    }

    #[test]
    fn test_modified_rfc3339_has_offset() {
        let dir = TempDir::new().unwrap();
        let path = write_record(&dir, "a.json", &json!({"id": "a"}));

        let store = RecordStore::open(dir.path()).unwrap();
        let mtime = store.modified_rfc3339(&path).unwrap();

        // RFC 3339 with a fixed offset: parseable by chrono.
        assert!(DateTime::parse_from_rfc3339(&mtime).is_ok());
    }

    #[test]
    fn test_issue_id_accessor() {
        assert_eq!(issue_id(&json!({"id": "abc"})), Some("abc"));
        assert_eq!(issue_id(&json!({"id": 7})), None);
        assert_eq!(issue_id(&json!({})), None);
    }

    #[test]
    fn test_timestamp_field_accessor() {
        let record = json!({"created_at": "t0"});
        assert_eq!(timestamp_field(&record, "created_at"), Some("t0"));
        assert_eq!(timestamp_field(&record, "updated_at"), None);
    }
}
