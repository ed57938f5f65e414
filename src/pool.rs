//! In-memory agent capacity bookkeeping.
//!
//! The pool tracks per-agent load for the lifetime of one orchestrator
//! process. Pool order is fixed at construction and defines the tie-break
//! among equally available agents: matching is first-fit, not load-balanced.
//!
//! Load is never decremented here. Completion signals belong to the agent
//! runtime, and a process restart is a cold start: all loads reset to zero.

use crate::config::AgentConfig;
use crate::error::{BosunError, Result};

/// One agent's capacity and current load.
#[derive(Debug, Clone)]
struct AgentSlot {
    id: String,
    max_concurrent: u32,
    current_load: u32,
}

/// Bounded pool of worker agents.
#[derive(Debug)]
pub struct AgentPool {
    agents: Vec<AgentSlot>,
}

impl AgentPool {
    /// Build a pool from agent configs, preserving their order.
    pub fn new(configs: &[AgentConfig]) -> Self {
        let agents = configs
            .iter()
            .map(|c| AgentSlot {
                id: c.id.clone(),
                max_concurrent: c.max_concurrent,
                current_load: 0,
            })
            .collect();

        Self { agents }
    }

    /// The first agent (in pool order) with spare capacity, or None if the
    /// pool is saturated.
    pub fn available_agent(&self) -> Option<&str> {
        self.agents
            .iter()
            .find(|a| a.current_load < a.max_concurrent)
            .map(|a| a.id.as_str())
    }

    /// Record one assignment against an agent.
    ///
    /// Fails with an internal error if the agent is unknown or already at
    /// capacity; callers are expected to pick agents via [`available_agent`]
    /// first, so either failure is an invariant violation.
    ///
    /// [`available_agent`]: AgentPool::available_agent
    pub fn record_assignment(&mut self, agent_id: &str) -> Result<()> {
        let agent = self
            .agents
            .iter_mut()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| BosunError::Internal(format!("unknown agent '{}'", agent_id)))?;

        if agent.current_load >= agent.max_concurrent {
            return Err(BosunError::Internal(format!(
                "assignment recorded against saturated agent '{}' ({}/{})",
                agent_id, agent.current_load, agent.max_concurrent
            )));
        }

        agent.current_load += 1;
        Ok(())
    }

    /// Total unclaimed capacity across all agents.
    pub fn spare_capacity(&self) -> u32 {
        self.agents
            .iter()
            .map(|a| a.max_concurrent - a.current_load)
            .sum()
    }

    /// Number of agents in the pool.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// True if the pool has no agents.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Current load of an agent, if it exists.
    #[cfg(test)]
    fn current_load(&self, agent_id: &str) -> Option<u32> {
        self.agents
            .iter()
            .find(|a| a.id == agent_id)
            .map(|a| a.current_load)
    }
}
