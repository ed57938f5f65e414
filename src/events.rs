//! Event log reader.
//!
//! The event log is an append-only NDJSON file (one JSON object per line).
//! Each record carries at least `issue_id`, a `type`, and a `timestamp`
//! (a fixed-offset RFC 3339 string). Per-issue order in the file is the
//! order events were appended; global order across issues is irrelevant.
//!
//! The log is read-only here: reloading from the start is always safe.
//! Malformed lines are skipped with a warning, never a hard failure, and an
//! absent file means zero events.

use serde::Deserialize;
use std::path::Path;

/// Event type marking issue creation.
pub const ISSUE_CREATED: &str = "issue_created";

/// One issue lifecycle event from the log.
///
/// Extra fields on the wire (event id, titles, state transitions) are
/// ignored; timestamps stay opaque strings and are compared by equality.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEvent {
    /// Issue this event belongs to.
    pub issue_id: String,

    /// Event type (`issue_created`, `issue_claimed`, ...).
    #[serde(rename = "type")]
    pub kind: String,

    /// Fixed-offset RFC 3339 timestamp string.
    pub timestamp: String,
}

impl LogEvent {
    /// True if this event marks the creation of its issue.
    pub fn is_creation(&self) -> bool {
        self.kind == ISSUE_CREATED
    }
}

/// Load all events from an NDJSON log file, preserving file order.
///
/// An absent file yields an empty log. Blank lines are ignored; lines that
/// fail to parse as an event are skipped with a warning.
pub fn load_events(path: &Path) -> Vec<LogEvent> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            eprintln!(
                "Warning: failed to read event log '{}': {}",
                path.display(),
                e
            );
            return Vec::new();
        }
    };

    let mut events = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<LogEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) => eprintln!(
                "Warning: skipping malformed event at {}:{}: {}",
                path.display(),
                line_no + 1,
                e
            ),
        }
    }

    events
}

/// Events belonging to one issue, in log order.
pub fn events_for<'a>(events: &'a [LogEvent], issue_id: &str) -> Vec<&'a LogEvent> {
    events.iter().filter(|e| e.issue_id == issue_id).collect()
}
