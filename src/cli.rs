//! CLI argument parsing for bosun.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bosun: priority-based issue dispatcher for bounded agent pools.
///
/// Bosun polls an external issue store for ready work, ranks it by priority,
/// and claims issues against a configured pool of agents. It also reconciles
/// each issue's `created_at`/`updated_at` fields from the append-only event
/// log.
#[derive(Parser, Debug)]
#[command(name = "bosun")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands for bosun.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the dispatch loop until interrupted.
    ///
    /// Polls the issue store on the configured interval and claims ready
    /// issues for available agents. Ctrl-C lets the in-flight cycle finish
    /// and then stops the loop.
    Run(RunArgs),

    /// Run exactly one dispatch cycle and print the assignment count.
    Dispatch(DispatchArgs),

    /// Fill missing created_at/updated_at fields from the event log.
    ///
    /// Only acts on issue records missing one or both timestamp fields;
    /// existing values are never overwritten.
    Migrate(ReconcileArgs),

    /// Recompute created_at/updated_at from the event log.
    ///
    /// Overwrites stored values that differ from the derived ones. Records
    /// with no events keep their stored timestamps.
    Repair(ReconcileArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "bosun.yaml")]
    pub config: PathBuf,

    /// Directory the issue store command runs in.
    #[arg(short = 'C', long, default_value = ".")]
    pub repo: PathBuf,

    /// Run a single dispatch cycle and exit instead of looping.
    #[arg(long)]
    pub once: bool,
}

/// Arguments for the `dispatch` command.
#[derive(Parser, Debug)]
pub struct DispatchArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "bosun.yaml")]
    pub config: PathBuf,

    /// Directory the issue store command runs in.
    #[arg(short = 'C', long, default_value = ".")]
    pub repo: PathBuf,
}

/// Arguments shared by the `migrate` and `repair` commands.
#[derive(Parser, Debug)]
pub struct ReconcileArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "bosun.yaml")]
    pub config: PathBuf,

    /// Base directory for relative issues_dir/events_file paths.
    #[arg(short = 'C', long, default_value = ".")]
    pub repo: PathBuf,

    /// Compute and report changes without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}
