//! Implementation of the `migrate` and `repair` commands.
//!
//! Thin glue around [`crate::reconcile::reconcile`]: resolves the issues
//! directory and event log from the config (relative to `--repo`), runs one
//! pass, and prints the summary.

use crate::cli::ReconcileArgs;
use crate::config::Config;
use crate::error::Result;
use crate::reconcile::{Mode, reconcile};
use std::path::{Path, PathBuf};

pub fn cmd_migrate(args: ReconcileArgs) -> Result<()> {
    run_reconcile(args, Mode::Migrate)
}

pub fn cmd_repair(args: ReconcileArgs) -> Result<()> {
    run_reconcile(args, Mode::Repair)
}

fn run_reconcile(args: ReconcileArgs, mode: Mode) -> Result<()> {
    let config = Config::load(&args.config)?;

    let issues_dir = resolve_path(&args.repo, &config.issues_dir);
    let events_path = resolve_path(&args.repo, &config.events_file);

    if args.dry_run {
        eprintln!("Dry run: no files will be modified");
    }

    let summary = reconcile(&issues_dir, &events_path, mode, args.dry_run)?;

    println!(
        "{} {}/{} issue record(s)",
        if args.dry_run { "Would modify" } else { "Modified" },
        summary.changed,
        summary.examined
    );
    if summary.skipped > 0 {
        eprintln!("Warning: skipped {} malformed record(s)", summary.skipped);
    }

    Ok(())
}

fn resolve_path(repo: &Path, configured: &str) -> PathBuf {
    let path = PathBuf::from(configured);
    if path.is_absolute() {
        path
    } else {
        repo.join(path)
    }
}
