//! Dispatch scheduler: the poll/rank/match/claim loop.
//!
//! One scheduler runs per orchestrator process and owns the agent pool
//! exclusively. Cycles execute sequentially; the only suspension point is
//! the idle wait between cycles, which races the poll timer against a
//! shutdown signal so cancellation never waits out a full interval. An
//! in-flight cycle always runs to completion, so the process exits with a
//! definite assignment count.

use crate::config::Config;
use crate::pool::AgentPool;
use crate::rank;
use crate::store::{ClaimError, IssueStore};
use std::time::Duration;
use tokio::sync::watch;

/// Priority dispatcher over a bounded agent pool.
pub struct Scheduler {
    pool: AgentPool,
    poll_interval: Duration,
}

impl Scheduler {
    /// Build a scheduler from config. Pool order follows the config's agent
    /// order; loads start at zero (cold start).
    pub fn new(config: &Config) -> Self {
        Self {
            pool: AgentPool::new(&config.agents),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        }
    }

    /// The scheduler's agent pool.
    pub fn pool(&self) -> &AgentPool {
        &self.pool
    }

    /// Run one dispatch cycle and return the number of assignments made.
    ///
    /// A failed ready query or an empty ready set yields zero assignments;
    /// query failures are reported but never fatal. The walk over ranked
    /// issues stops as soon as the pool is saturated, leaving lower-ranked
    /// issues for the next cycle. A failed claim (lost race or unreachable
    /// store) does not consume agent capacity; the walk continues to the
    /// next issue with the same agent still available.
    pub fn dispatch_cycle<S: IssueStore>(&mut self, store: &S) -> usize {
        let mut issues = match store.list_ready() {
            Ok(issues) => issues,
            Err(e) => {
                eprintln!("Warning: ready query failed, skipping cycle: {}", e);
                return 0;
            }
        };

        if issues.is_empty() {
            return 0;
        }

        rank::sort_by_rank(&mut issues);

        let mut assigned = 0;
        for issue in &issues {
            let Some(agent_id) = self.pool.available_agent().map(str::to_string) else {
                break;
            };

            // Agent ids are namespaced by caller convention so the store can
            // tell them apart from issue identifiers.
            match store.claim(&issue.id, &format!("agent:{}", agent_id)) {
                Ok(()) => {
                    if let Err(e) = self.pool.record_assignment(&agent_id) {
                        eprintln!("Warning: {}", e);
                        break;
                    }
                    if issue.title.is_empty() {
                        eprintln!("dispatch: assigned {} to {}", issue.id, agent_id);
                    } else {
                        eprintln!(
                            "dispatch: assigned {} ({}) to {}",
                            issue.id, issue.title, agent_id
                        );
                    }
                    assigned += 1;
                }
                Err(ClaimError::Rejected(reason)) => {
                    eprintln!("dispatch: lost claim for {}: {}", issue.id, reason);
                }
                Err(ClaimError::Unavailable(e)) => {
                    eprintln!("Warning: claim for {} failed: {}", issue.id, e);
                }
            }
        }

        assigned
    }

    /// Run dispatch cycles until the shutdown signal fires.
    ///
    /// Between cycles the loop awaits whichever comes first: the poll
    /// interval elapsing or the shutdown receiver changing. Returns the
    /// total number of assignments made over the run.
    pub async fn run<S: IssueStore>(
        &mut self,
        store: &S,
        mut shutdown: watch::Receiver<bool>,
    ) -> u64 {
        let mut total = 0u64;

        loop {
            let assigned = self.dispatch_cycle(store);
            total += assigned as u64;
            if assigned > 0 {
                eprintln!(
                    "dispatch: {} assignment(s) this cycle, {} spare slot(s) left",
                    assigned,
                    self.pool.spare_capacity()
                );
            }

            tokio::select! {
                // Fires on signal, or immediately if the sender is gone.
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        total
    }
}
