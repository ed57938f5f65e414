//! Issue store access: ready-issue queries and the claim protocol.
//!
//! The store is an external service reached through a command/response
//! contract. [`CommandStore`] shells out to a configured tracker CLI, the
//! same way agent work is driven elsewhere in this codebase; tests use an
//! in-memory implementation of [`IssueStore`].
//!
//! Claiming is atomic on the store side and is not retried here: concurrent
//! orchestrators racing for the same issue are expected, and a lost race is
//! a normal outcome. The issue simply reappears as ready on a later poll if
//! the winner releases it.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// A work item eligible for assignment, as returned by the store.
///
/// Unknown extra fields in the store's reply are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadyIssue {
    /// Opaque stable identifier.
    pub id: String,

    /// Human-readable title; informational only.
    #[serde(default)]
    pub title: String,

    /// Priority string (`critical`/`high`/`normal`/`low`). Absent or
    /// unrecognized values rank worst.
    #[serde(default)]
    pub priority: Option<String>,
}

/// Failure to query the ready set.
///
/// Both variants are absorbed by the scheduler as an empty ready set plus a
/// warning; neither is fatal to the dispatch loop.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store process could not be executed or exited unsuccessfully.
    #[error("store unreachable: {0}")]
    Transport(String),

    /// The store replied, but not with the expected JSON shape.
    #[error("malformed store response: {0}")]
    Malformed(String),
}

/// Failure to claim an issue.
#[derive(Error, Debug)]
pub enum ClaimError {
    /// The store refused the claim: the issue is no longer ready, most
    /// likely because another orchestrator won the race.
    #[error("claim rejected: {0}")]
    Rejected(String),

    /// The store could not be reached at all.
    #[error("store unreachable: {0}")]
    Unavailable(String),
}

/// Command/response contract with the issue store.
pub trait IssueStore {
    /// List issues currently eligible for assignment, in the store's own
    /// secondary order.
    fn list_ready(&self) -> Result<Vec<ReadyIssue>, StoreError>;

    /// Atomically transition an issue from ready to claimed-by-agent.
    ///
    /// On failure, neither the issue nor any caller-side state has changed.
    fn claim(&self, issue_id: &str, agent_id: &str) -> Result<(), ClaimError>;
}

/// Issue store reached by running a tracker CLI.
///
/// The configured command string may carry arguments (split with shell
/// quoting rules); bosun appends the query/claim subcommands and runs the
/// process in the repo directory.
#[derive(Debug)]
pub struct CommandStore {
    program: String,
    base_args: Vec<String>,
    workdir: PathBuf,
}

impl CommandStore {
    /// Build a store from the configured command string and repo directory.
    ///
    /// Returns None if the command string is empty or cannot be split.
    pub fn new(store_command: &str, workdir: &Path) -> Option<Self> {
        let words = shell_words::split(store_command).ok()?;
        let (program, base_args) = words.split_first()?;

        Some(Self {
            program: program.clone(),
            base_args: base_args.to_vec(),
            workdir: workdir.to_path_buf(),
        })
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .args(args)
            .current_dir(&self.workdir);
        cmd
    }
}

impl IssueStore for CommandStore {
    fn list_ready(&self) -> Result<Vec<ReadyIssue>, StoreError> {
        let output = self
            .command(&["query", "ready", "--json"])
            .output()
            .map_err(|e| StoreError::Transport(format!("failed to run '{}': {}", self.program, e)))?;

        if !output.status.success() {
            return Err(StoreError::Transport(format!(
                "'{} query ready' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        parse_ready_issues(&json)
    }

    fn claim(&self, issue_id: &str, agent_id: &str) -> Result<(), ClaimError> {
        let output = self
            .command(&["issue", "claim", issue_id, agent_id])
            .output()
            .map_err(|e| {
                ClaimError::Unavailable(format!("failed to run '{}': {}", self.program, e))
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ClaimError::Rejected(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

/// Extract ready issues from a store reply.
///
/// Expects `{"data": {"issues": [...]}}`. Entries that fail to deserialize
/// (e.g. a record missing its `id`) are skipped with a warning; the rest of
/// the reply is still used.
fn parse_ready_issues(json: &serde_json::Value) -> Result<Vec<ReadyIssue>, StoreError> {
    let entries = json["data"]["issues"]
        .as_array()
        .ok_or_else(|| StoreError::Malformed("expected 'data.issues' array".to_string()))?;

    let mut issues = Vec::with_capacity(entries.len());
    for entry in entries {
        match serde_json::from_value::<ReadyIssue>(entry.clone()) {
            Ok(issue) => issues.push(issue),
            Err(e) => eprintln!("Warning: skipping malformed issue entry: {}", e),
        }
    }

    Ok(issues)
}
