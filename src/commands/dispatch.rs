//! Implementation of the `run` and `dispatch` commands.
//!
//! `dispatch` runs exactly one cycle; `run` loops on the configured poll
//! interval until Ctrl-C. Shutdown is signalled through a watch channel so
//! the idle wait between cycles is interrupted immediately, while an
//! in-flight cycle always finishes with a definite assignment count.

use crate::cli::{DispatchArgs, RunArgs};
use crate::config::Config;
use crate::error::{BosunError, Result};
use crate::scheduler::Scheduler;
use crate::store::CommandStore;
use std::path::Path;
use tokio::sync::watch;

/// Load config and build the store for a dispatch-family command.
///
/// Both a missing/invalid config file and an unset `store_command` are
/// configuration failures: the dispatcher cannot do anything without them.
fn dispatch_setup(config_path: &Path, repo: &Path) -> Result<(Config, CommandStore)> {
    let config = Config::load(config_path)?;

    if config.agents.is_empty() {
        return Err(BosunError::ConfigError(
            "no agents configured; add an `agents:` section to the config".to_string(),
        ));
    }

    let store = CommandStore::new(&config.store_command, repo).ok_or_else(|| {
        BosunError::ConfigError(
            "store_command must be set to the issue store CLI (e.g. `store_command: tracker`)"
                .to_string(),
        )
    })?;

    Ok((config, store))
}

pub fn cmd_dispatch(args: DispatchArgs) -> Result<()> {
    let (config, store) = dispatch_setup(&args.config, &args.repo)?;
    let mut scheduler = Scheduler::new(&config);

    let assigned = scheduler.dispatch_cycle(&store);
    println!("Assigned {} issue(s)", assigned);

    Ok(())
}

pub async fn cmd_run(args: RunArgs) -> Result<()> {
    let (config, store) = dispatch_setup(&args.config, &args.repo)?;
    let mut scheduler = Scheduler::new(&config);

    if args.once {
        let assigned = scheduler.dispatch_cycle(&store);
        println!("Assigned {} issue(s)", assigned);
        return Ok(());
    }

    eprintln!("bosun run started");
    eprintln!("  repo:     {}", args.repo.display());
    eprintln!(
        "  agents:   {} ({} slot(s))",
        scheduler.pool().len(),
        scheduler.pool().spare_capacity()
    );
    eprintln!("  interval: {}s", config.poll_interval_secs);
    eprintln!();

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("bosun: shutdown requested, finishing current cycle");
            let _ = tx.send(true);
        }
    });

    let total = scheduler.run(&store, rx).await;
    eprintln!("bosun run stopped ({} assignment(s) total)", total);

    Ok(())
}
