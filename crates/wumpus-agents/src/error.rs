//! Error types for the wumpus-agents crate.
//!
//! Map defects and world failures propagate through [`AgentError`] with `?`.
//! Unreachable targets and blocked moves are ordinary outcomes and never
//! show up here.

use wumpus_types::{AgentId, TaskId};
use wumpus_world::WorldError;

use crate::port::PortError;

/// Errors that can occur while an agent runs its cycle.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A belief-map operation hit an invariant violation.
    #[error("map error: {0}")]
    World(#[from] WorldError),

    /// The world refused or failed a sensor read or action.
    #[error("world port error: {0}")]
    Port(#[from] PortError),

    /// The mover was asked to move with no destination set.
    #[error("agent {0} has no destination")]
    NoDestination(AgentId),

    /// The agent was asked to act after it died.
    #[error("agent {0} is dead")]
    Dead(AgentId),

    /// The task queue selected a task it does not hold.
    #[error("agent {0} selected task {1}, which is not in its queue")]
    MissingTask(AgentId, TaskId),
}
