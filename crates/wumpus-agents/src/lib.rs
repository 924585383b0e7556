//! Agent behavior for the Wumpus World explorer.
//!
//! This crate is the decision layer: it turns an agent's belief map into
//! tasks, ranks them, and executes them one world action at a time. It
//! sits between `wumpus-world` (belief state and pathfinding) and
//! `wumpus-core` (ground truth and the run loops). Everything here talks
//! to the world through the [`WorldPort`] trait and never sees ground
//! truth directly.
//!
//! # Modules
//!
//! - [`agent`] -- The per-agent control loop ([`Agent`])
//! - [`config`] -- Per-agent configuration ([`AgentConfig`])
//! - [`error`] -- Error types for agent operations ([`AgentError`])
//! - [`movement`] -- One-step movement with collision recovery ([`Mover`])
//! - [`plan`] -- Role plans: search, fetch, hunt, return ([`Plan`])
//! - [`port`] -- The world seam ([`WorldPort`])
//! - [`ranking`] -- Task ordering by priority then proximity
//! - [`scheduler`] -- The task queue with discovery and preemption ([`TaskQueue`])
//! - [`sensors`] -- Sensor reading policy and fusion
//! - [`task`] -- A role against a target ([`Task`])

pub mod agent;
pub mod config;
pub mod error;
pub mod movement;
pub mod plan;
pub mod port;
pub mod ranking;
pub mod scheduler;
pub mod sensors;
pub mod task;

// Re-export primary types at crate root for convenience.
pub use agent::{Agent, AgentStats, AgentStatus, AgentSummary, StepReport};
pub use config::{AgentConfig, COLLISION_RETRY_LIMIT, DEFAULT_AMMO, DEFAULT_RETURN_LOCATIONS};
pub use error::AgentError;
pub use movement::{Mover, Step};
pub use plan::{Kit, Plan, PlanContext, PlanEvent, TARGETING_RANGE};
pub use port::{FireOutcome, MoveOutcome, PortError, WorldPort};
pub use scheduler::TaskQueue;
pub use sensors::{SensorSweep, read_sensors};
pub use task::Task;
