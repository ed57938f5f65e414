//! Log-derived timestamp reconciliation.
//!
//! Derives canonical `created_at`/`updated_at` fields for each issue record
//! from its event history and applies them idempotently:
//!
//! - **Migrate** only acts on records missing one or both fields and never
//!   overwrites an existing value.
//! - **Repair** recomputes from the event log unconditionally and overwrites
//!   stored values that differ from the derived ones.
//!
//! Both modes support a dry run that reports the would-be change without
//! persisting anything. Running either mode twice over the same inputs
//! produces no change on the second pass.

use crate::error::Result;
use crate::events::{self, LogEvent};
use crate::records::{self, RecordStore};
use std::path::Path;

/// Reconciliation operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fill missing timestamp fields only.
    Migrate,
    /// Recompute from the event log and overwrite differing values.
    Repair,
}

impl Mode {
    fn label(self) -> &'static str {
        match self {
            Mode::Migrate => "migrate",
            Mode::Repair => "repair",
        }
    }
}

/// Timestamps derived for one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    pub created_at: String,
    pub updated_at: String,
}

/// Counts for one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Records visited.
    pub examined: usize,
    /// Records changed (or that would change, in a dry run).
    pub changed: usize,
    /// Records skipped as malformed.
    pub skipped: usize,
}

/// Derive timestamps from one issue's event subsequence (in log order).
///
/// `created_at` is the earliest creation-marker event's timestamp, falling
/// back to the first event, falling back to `fallback`. `updated_at` is the
/// last event's timestamp (the log is append-only, so the last entry is the
/// chronologically latest), with the same fallback.
pub fn derive_timestamps(issue_events: &[&LogEvent], fallback: &str) -> Derived {
    let created_at = issue_events
        .iter()
        .find(|e| e.is_creation())
        .or_else(|| issue_events.first())
        .map(|e| e.timestamp.clone())
        .unwrap_or_else(|| fallback.to_string());

    let updated_at = issue_events
        .last()
        .map(|e| e.timestamp.clone())
        .unwrap_or_else(|| fallback.to_string());

    Derived {
        created_at,
        updated_at,
    }
}

/// Run one reconciliation pass over every record in `issues_dir`.
///
/// A missing issues directory is a configuration failure; a missing event
/// log is just zero events. Malformed records (unparseable JSON, missing
/// `id`) are skipped with a warning.
pub fn reconcile(issues_dir: &Path, events_path: &Path, mode: Mode, dry_run: bool) -> Result<Summary> {
    let store = RecordStore::open(issues_dir)?;
    let events = events::load_events(events_path);

    let mut summary = Summary::default();

    for path in store.record_paths()? {
        summary.examined += 1;

        let record = match store.load(&path) {
            Ok(record) => record,
            Err(e) => {
                eprintln!("Warning: {}", e);
                summary.skipped += 1;
                continue;
            }
        };

        let Some(id) = records::issue_id(&record).map(str::to_string) else {
            eprintln!(
                "Warning: record '{}' has no id, skipping",
                path.display()
            );
            summary.skipped += 1;
            continue;
        };

        let stored_created = records::timestamp_field(&record, "created_at").map(str::to_string);
        let stored_updated = records::timestamp_field(&record, "updated_at").map(str::to_string);

        // Migrate never touches a record that already carries both fields.
        if mode == Mode::Migrate && stored_created.is_some() && stored_updated.is_some() {
            continue;
        }

        let issue_events = events::events_for(&events, &id);

        let fallback = if issue_events.is_empty() {
            if stored_created.is_some() && stored_updated.is_some() {
                // Repair with no events: nothing better to recompute from.
                continue;
            }
            store.modified_rfc3339(&path)?
        } else {
            String::new()
        };

        let derived = derive_timestamps(&issue_events, &fallback);

        let (created_at, updated_at) = if mode == Mode::Repair && !issue_events.is_empty() {
            (derived.created_at, derived.updated_at)
        } else {
            // Fill only the missing fields; existing values stay.
            (
                stored_created.clone().unwrap_or(derived.created_at),
                stored_updated.clone().unwrap_or(derived.updated_at),
            )
        };

        if stored_created.as_deref() == Some(created_at.as_str())
            && stored_updated.as_deref() == Some(updated_at.as_str())
        {
            continue;
        }

        summary.changed += 1;

        if dry_run {
            println!(
                "{}: {}: would set created_at={} updated_at={}",
                mode.label(),
                id,
                created_at,
                updated_at
            );
        } else {
            store.patch_timestamps(&path, record, &created_at, &updated_at)?;
            println!(
                "{}: {}: set created_at={} updated_at={}",
                mode.label(),
                id,
                created_at,
                updated_at
            );
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn event(issue_id: &str, kind: &str, timestamp: &str) -> LogEvent {
        LogEvent {
            issue_id: issue_id.to_string(),
            kind: kind.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    fn write_events(dir: &TempDir, events: &[(&str, &str, &str)]) -> PathBuf {
        let path = dir.path().join("events.ndjson");
        let mut file = std::fs::File::create(&path).unwrap();
        for (issue_id, kind, timestamp) in events {
            writeln!(
                file,
                r#"{{"type":"{}","issue_id":"{}","timestamp":"{}"}}"#,
                kind, issue_id, timestamp
            )
            .unwrap();
        }
        path
    }

    fn write_record(issues_dir: &Path, id: &str, value: &Value) -> PathBuf {
        let path = issues_dir.join(format!("{}.json", id));
        std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    fn setup(records: &[(&str, Value)], events: &[(&str, &str, &str)]) -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let issues_dir = dir.path().join("issues");
        std::fs::create_dir(&issues_dir).unwrap();
        for (id, value) in records {
            write_record(&issues_dir, id, value);
        }
        let events_path = write_events(&dir, events);
        (dir, issues_dir, events_path)
    }

    fn load(issues_dir: &Path, id: &str) -> Value {
        let content = std::fs::read_to_string(issues_dir.join(format!("{}.json", id))).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[test]
    fn test_derive_prefers_creation_marker() {
        let events = vec![
            event("x", "issue_reopened", "t0"),
            event("x", "issue_created", "t1"),
            event("x", "issue_claimed", "t2"),
        ];
        let refs: Vec<&LogEvent> = events.iter().collect();

        let derived = derive_timestamps(&refs, "fallback");

        assert_eq!(derived.created_at, "t1");
        assert_eq!(derived.updated_at, "t2");
    }

    #[test]
    fn test_derive_uses_earliest_creation_marker() {
        let events = vec![
            event("x", "issue_created", "t0"),
            event("x", "issue_created", "t1"),
        ];
        let refs: Vec<&LogEvent> = events.iter().collect();

        assert_eq!(derive_timestamps(&refs, "f").created_at, "t0");
    }

    #[test]
    fn test_derive_without_creation_marker_uses_first_event() {
        let events = vec![
            event("x", "issue_claimed", "t0"),
            event("x", "issue_closed", "t1"),
        ];
        let refs: Vec<&LogEvent> = events.iter().collect();

        let derived = derive_timestamps(&refs, "fallback");

        assert_eq!(derived.created_at, "t0");
        assert_eq!(derived.updated_at, "t1");
    }

    #[test]
    fn test_derive_without_events_uses_fallback_for_both() {
        let derived = derive_timestamps(&[], "2024-05-01T00:00:00+02:00");

        assert_eq!(derived.created_at, "2024-05-01T00:00:00+02:00");
        assert_eq!(derived.updated_at, derived.created_at);
    }

    #[test]
    fn test_migrate_fills_missing_fields_from_events() {
        let (_dir, issues_dir, events_path) = setup(
            &[("a", json!({"id": "a", "title": "T"}))],
            &[
                ("a", "issue_created", "t0"),
                ("a", "issue_claimed", "t1"),
                ("a", "issue_closed", "t2"),
            ],
        );

        let summary = reconcile(&issues_dir, &events_path, Mode::Migrate, false).unwrap();

        assert_eq!(summary.examined, 1);
        assert_eq!(summary.changed, 1);
        let record = load(&issues_dir, "a");
        assert_eq!(record["created_at"], "t0");
        assert_eq!(record["updated_at"], "t2");
        assert_eq!(record["title"], "T");
    }

    #[test]
    fn test_migrate_never_overwrites_existing_value() {
        // created_at is present; only updated_at gets filled.
        let (_dir, issues_dir, events_path) = setup(
            &[("a", json!({"id": "a", "created_at": "manual"}))],
            &[("a", "issue_created", "t0"), ("a", "issue_closed", "t1")],
        );

        reconcile(&issues_dir, &events_path, Mode::Migrate, false).unwrap();

        let record = load(&issues_dir, "a");
        assert_eq!(record["created_at"], "manual");
        assert_eq!(record["updated_at"], "t1");
    }

    #[test]
    fn test_migrate_skips_records_with_both_fields() {
        let (_dir, issues_dir, events_path) = setup(
            &[("a", json!({"id": "a", "created_at": "c", "updated_at": "u"}))],
            &[("a", "issue_created", "t0")],
        );

        let summary = reconcile(&issues_dir, &events_path, Mode::Migrate, false).unwrap();

        assert_eq!(summary.changed, 0);
        let record = load(&issues_dir, "a");
        assert_eq!(record["created_at"], "c");
        assert_eq!(record["updated_at"], "u");
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let (_dir, issues_dir, events_path) = setup(
            &[
                ("a", json!({"id": "a"})),
                ("b", json!({"id": "b"})),
            ],
            &[("a", "issue_created", "t0")],
        );

        let first = reconcile(&issues_dir, &events_path, Mode::Migrate, false).unwrap();
        assert_eq!(first.changed, 2);

        let second = reconcile(&issues_dir, &events_path, Mode::Migrate, false).unwrap();
        assert_eq!(second.changed, 0);
    }

    #[test]
    fn test_migrate_fallback_uses_record_mtime() {
        let (_dir, issues_dir, events_path) =
            setup(&[("a", json!({"id": "a"}))], &[("other", "issue_created", "t0")]);

        reconcile(&issues_dir, &events_path, Mode::Migrate, false).unwrap();

        let record = load(&issues_dir, "a");
        let created = record["created_at"].as_str().unwrap();
        assert_eq!(record["updated_at"].as_str().unwrap(), created);
        assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok());
    }

    #[test]
    fn test_repair_overwrites_wrong_values() {
        // Stored values came from a buggy derivation; repair recomputes both.
        let (_dir, issues_dir, events_path) = setup(
            &[("x", json!({"id": "x", "created_at": "wrong", "updated_at": "wrong"}))],
            &[
                ("x", "issue_created", "t0"),
                ("x", "issue_claimed", "t1"),
                ("x", "issue_closed", "t2"),
            ],
        );

        let summary = reconcile(&issues_dir, &events_path, Mode::Repair, false).unwrap();

        assert_eq!(summary.changed, 1);
        let record = load(&issues_dir, "x");
        assert_eq!(record["created_at"], "t0");
        assert_eq!(record["updated_at"], "t2");
    }

    #[test]
    fn test_repair_no_change_when_already_correct() {
        let (_dir, issues_dir, events_path) = setup(
            &[("x", json!({"id": "x", "created_at": "t0", "updated_at": "t1"}))],
            &[("x", "issue_created", "t0"), ("x", "issue_closed", "t1")],
        );

        let summary = reconcile(&issues_dir, &events_path, Mode::Repair, false).unwrap();

        assert_eq!(summary.changed, 0);
    }

    #[test]
    fn test_repair_is_idempotent() {
        let (_dir, issues_dir, events_path) = setup(
            &[("x", json!({"id": "x", "created_at": "bad", "updated_at": "bad"}))],
            &[("x", "issue_created", "t0"), ("x", "issue_closed", "t1")],
        );

        let first = reconcile(&issues_dir, &events_path, Mode::Repair, false).unwrap();
        assert_eq!(first.changed, 1);

        let second = reconcile(&issues_dir, &events_path, Mode::Repair, false).unwrap();
        assert_eq!(second.changed, 0);
    }

    #[test]
    fn test_repair_keeps_stored_values_without_events() {
        let (_dir, issues_dir, events_path) = setup(
            &[("x", json!({"id": "x", "created_at": "c", "updated_at": "u"}))],
            &[],
        );

        let summary = reconcile(&issues_dir, &events_path, Mode::Repair, false).unwrap();

        assert_eq!(summary.changed, 0);
        let record = load(&issues_dir, "x");
        assert_eq!(record["created_at"], "c");
        assert_eq!(record["updated_at"], "u");
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let (_dir, issues_dir, events_path) = setup(
            &[("a", json!({"id": "a"}))],
            &[("a", "issue_created", "t0")],
        );

        let summary = reconcile(&issues_dir, &events_path, Mode::Migrate, true).unwrap();

        assert_eq!(summary.changed, 1);
        let record = load(&issues_dir, "a");
        assert!(record.get("created_at").is_none());
        assert!(record.get("updated_at").is_none());
    }

    #[test]
    fn test_record_without_id_is_skipped() {
        let (_dir, issues_dir, events_path) = setup(
            &[
                ("noid", json!({"title": "no id here"})),
                ("a", json!({"id": "a"})),
            ],
            &[("a", "issue_created", "t0")],
        );

        let summary = reconcile(&issues_dir, &events_path, Mode::Migrate, false).unwrap();

        assert_eq!(summary.examined, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.changed, 1);
    }

    #[test]
    fn test_unparseable_record_is_skipped() {
        let dir = TempDir::new().unwrap();
        let issues_dir = dir.path().join("issues");
        std::fs::create_dir(&issues_dir).unwrap();
        std::fs::write(issues_dir.join("bad.json"), "{ not json").unwrap();
        write_record(&issues_dir, "a", &json!({"id": "a"}));
        let events_path = write_events(&dir, &[("a", "issue_created", "t0")]);

        let summary = reconcile(&issues_dir, &events_path, Mode::Migrate, false).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.changed, 1);
    }

    #[test]
    fn test_missing_issues_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let events_path = dir.path().join("events.ndjson");

        let err = reconcile(&dir.path().join("missing"), &events_path, Mode::Migrate, false)
            .unwrap_err();

        assert_eq!(err.exit_code(), crate::exit_codes::CONFIG_FAILURE);
    }

    #[test]
    fn test_missing_events_file_falls_back_to_mtime() {
        let dir = TempDir::new().unwrap();
        let issues_dir = dir.path().join("issues");
        std::fs::create_dir(&issues_dir).unwrap();
        write_record(&issues_dir, "a", &json!({"id": "a"}));

        let summary = reconcile(
            &issues_dir,
            &dir.path().join("no-events.ndjson"),
            Mode::Migrate,
            false,
        )
        .unwrap();

        assert_eq!(summary.changed, 1);
        let record = load(&issues_dir, "a");
        assert_eq!(record["created_at"], record["updated_at"]);
    }
}
