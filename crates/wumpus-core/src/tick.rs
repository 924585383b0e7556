//! Lockstep tick cycle: every agent takes one turn per tick, in roster order.
//!
//! Each turn an agent:
//!
//! 1. **Absorbs** every map published to it since its last turn.
//! 2. **Steps** once against the environment.
//! 3. **Publishes** its map to every other agent's mailbox if it changed.
//!
//! Agents that finish are retired from the field so they stop blocking
//! the rest. The cycle is deterministic given the same seeds, which makes
//! it the mode of choice for tests and reproducible runs.

use std::sync::Arc;

use tracing::debug;
use wumpus_agents::{Agent, AgentError, AgentStatus};
use wumpus_types::AgentId;
use wumpus_world::Grid;

use crate::environment::Environment;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// An agent failed its turn.
    #[error("agent error for {agent_id}: {source}")]
    Agent {
        /// The agent that failed.
        agent_id: AgentId,
        /// The underlying agent error.
        source: AgentError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Agents that took a turn.
    pub active: usize,
    /// Maps published to peers.
    pub published: usize,
    /// Plan events raised.
    pub events: usize,
}

/// The agents of a lockstep run and their mailboxes.
#[derive(Debug)]
pub struct Lockstep {
    agents: Vec<Agent>,
    mailboxes: Vec<Vec<Arc<Grid>>>,
    tick: u64,
}

impl Lockstep {
    /// Wrap a team of agents, with empty mailboxes.
    pub fn new(agents: Vec<Agent>) -> Self {
        let mailboxes = agents.iter().map(|_| Vec::new()).collect();
        Self {
            agents,
            mailboxes,
            tick: 0,
        }
    }

    /// Ticks executed so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The agents, in roster order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Give the agents back.
    pub fn into_agents(self) -> Vec<Agent> {
        self.agents
    }

    /// Whether every agent is done or dead.
    pub fn all_finished(&self) -> bool {
        self.agents.iter().all(|a| a.status().is_terminal())
    }

    /// Run one tick.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Agent`] if any agent fails its turn; the tick
    /// stops at that agent.
    pub fn run_tick(&mut self, env: &mut Environment) -> Result<TickSummary, TickError> {
        self.tick = self.tick.saturating_add(1);
        let mut summary = TickSummary {
            tick: self.tick,
            active: 0,
            published: 0,
            events: 0,
        };

        for i in 0..self.agents.len() {
            let inbox = self.mailboxes.get_mut(i).map(std::mem::take).unwrap_or_default();
            let Some(agent) = self.agents.get_mut(i) else {
                continue;
            };
            let agent_id = agent.id();
            for grid in &inbox {
                agent
                    .absorb(grid)
                    .map_err(|source| TickError::Agent { agent_id, source })?;
            }
            if agent.status().is_terminal() {
                continue;
            }

            let report = agent
                .step(env)
                .map_err(|source| TickError::Agent { agent_id, source })?;
            summary.active = summary.active.saturating_add(1);
            summary.events = summary.events.saturating_add(report.events.len());
            if report.status == AgentStatus::Done {
                env.retire(agent_id);
            }

            if let Some(snapshot) = report.snapshot {
                for (j, mailbox) in self.mailboxes.iter_mut().enumerate() {
                    if j != i {
                        mailbox.push(Arc::clone(&snapshot));
                    }
                }
                summary.published = summary.published.saturating_add(1);
            }
        }

        debug!(
            tick = summary.tick,
            active = summary.active,
            published = summary.published,
            events = summary.events,
            "tick complete"
        );
        Ok(summary)
    }
}
