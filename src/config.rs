//! Configuration model for bosun.
//!
//! This module defines the Config struct that represents `bosun.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for optional fields, and validation of config values.
//!
//! The dispatcher and the reconciler read disjoint parts of the config:
//! `store_command`/`agents` drive dispatch, `issues_dir`/`events_file` drive
//! timestamp reconciliation. Requirements that only apply to one command
//! (e.g. a non-empty agent list for `run`) are enforced by the command
//! handlers, not here.

use crate::error::{BosunError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Configuration for a single agent in the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique identifier for this agent within the pool.
    pub id: String,

    /// Maximum concurrent issues this agent can hold.
    pub max_concurrent: u32,
}

/// Configuration for the bosun orchestrator.
///
/// This struct represents the contents of `bosun.yaml`. Unknown fields in
/// the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds to idle between dispatch cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Command used to reach the issue store (may contain arguments,
    /// e.g. `"tracker --repo ."`). Required for `run` and `dispatch`.
    #[serde(default)]
    pub store_command: String,

    /// Directory holding issue records (`<id>.json`), relative to the repo
    /// root unless absolute. Used by `migrate` and `repair`.
    #[serde(default = "default_issues_dir")]
    pub issues_dir: String,

    /// NDJSON event log, relative to the repo root unless absolute.
    /// An absent file is treated as zero events.
    #[serde(default = "default_events_file")]
    pub events_file: String,

    /// Agent pool, in priority order for first-fit matching.
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

fn default_poll_interval_secs() -> u64 {
    30
}
fn default_issues_dir() -> String {
    "issues".to_string()
}
fn default_events_file() -> String {
    "events.ndjson".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            store_command: String::new(),
            issues_dir: default_issues_dir(),
            events_file: default_events_file(),
            agents: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from a YAML file.
    ///
    /// A missing or unreadable file is a configuration failure: bosun does
    /// not fall back to defaults, since a silently empty agent pool would
    /// make the dispatcher a no-op.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            BosunError::ConfigError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    ///
    /// Unknown fields in the YAML are silently ignored for forward
    /// compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| BosunError::ConfigError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return an error on invalid values.
    ///
    /// Validation rules:
    /// - `poll_interval_secs` must be positive
    /// - agent ids must be non-empty and unique
    /// - agent `max_concurrent` must be positive
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(BosunError::ConfigError(
                "poll_interval_secs must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.id.is_empty() {
                return Err(BosunError::ConfigError(
                    "agent id must be non-empty".to_string(),
                ));
            }
            if !seen.insert(agent.id.as_str()) {
                return Err(BosunError::ConfigError(format!(
                    "duplicate agent id '{}'",
                    agent.id
                )));
            }
            if agent.max_concurrent == 0 {
                return Err(BosunError::ConfigError(format!(
                    "agent '{}' must have max_concurrent greater than 0",
                    agent.id
                )));
            }
        }

        Ok(())
    }
}
