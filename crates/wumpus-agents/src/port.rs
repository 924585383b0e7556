//! The seam between an agent and the world it explores.
//!
//! Agents never see ground truth. Everything they learn comes back through
//! the sensor methods of [`WorldPort`], and everything they do goes out
//! through its action methods. The simulation core implements this trait
//! over its ground-truth environment; tests implement it over small
//! scripted worlds.

use wumpus_types::{AgentId, Direction, Location, Offset};

/// Errors a world can report to an agent.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The world has no agent with this identifier.
    #[error("agent {0} is not registered with the world")]
    UnknownAgent(AgentId),

    /// The agent is dead and cannot sense or act.
    #[error("agent {0} is dead")]
    AgentDead(AgentId),

    /// The world failed for a reason of its own.
    #[error("world failure: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

/// What happened when an agent tried to step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The agent now stands at the given location.
    Moved(Location),
    /// Something was in the way; the agent did not move.
    Blocked,
    /// The agent stepped into a pit.
    Died,
}

/// What happened when an agent fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// A monster at the given location was killed.
    Killed(Location),
    /// The shot hit nothing.
    Missed,
    /// The agent had no ammunition left.
    Empty,
}

/// Sensor and actuator access for one agent at a time.
pub trait WorldPort {
    /// Obstructions within sonar range, as offsets from the agent.
    fn sonar(&mut self, agent: AgentId) -> Result<Vec<Offset>, PortError>;

    /// Whether a pit is within breeze range of the agent.
    fn breeze(&mut self, agent: AgentId) -> Result<bool, PortError>;

    /// Whether a live monster is within smell range of the agent.
    fn smell(&mut self, agent: AgentId) -> Result<bool, PortError>;

    /// Whether gold is within glitter range of the agent.
    fn glitter(&mut self, agent: AgentId) -> Result<bool, PortError>;

    /// Try to step one cell in `dir`.
    fn step(&mut self, agent: AgentId, dir: Direction) -> Result<MoveOutcome, PortError>;

    /// Pick up gold at the agent's location. Returns whether gold was taken.
    fn grab(&mut self, agent: AgentId) -> Result<bool, PortError>;

    /// Drop carried gold at the agent's location. Returns whether gold was
    /// delivered to a return site.
    fn deposit(&mut self, agent: AgentId) -> Result<bool, PortError>;

    /// Fire along `dir`.
    fn fire(&mut self, agent: AgentId, dir: Direction) -> Result<FireOutcome, PortError>;
}
