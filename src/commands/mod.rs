//! Command implementations for bosun.
//!
//! This module provides the router that maps parsed CLI commands to their
//! implementations. Command handlers own the fatal-error policy: anything
//! that makes meaningful work impossible (bad config, missing issues
//! directory) surfaces here as a terminating error, while transient store
//! failures stay absorbed inside the scheduler and reconciler.

mod dispatch;
mod reconcile;

use crate::cli::Command;
use crate::error::Result;

/// Route a command to its implementation.
pub async fn execute(command: Command) -> Result<()> {
    match command {
        Command::Run(args) => dispatch::cmd_run(args).await,
        Command::Dispatch(args) => dispatch::cmd_dispatch(args),
        Command::Migrate(args) => reconcile::cmd_migrate(args),
        Command::Repair(args) => reconcile::cmd_repair(args),
    }
}
