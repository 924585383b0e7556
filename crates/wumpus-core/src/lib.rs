//! Ground truth, configuration, and run loops for the Wumpus World explorer.
//!
//! This crate owns everything outside an agent's head: the generated world
//! the agents explore, the YAML configuration that describes world and
//! team, and the two ways of driving the team (deterministic lockstep and
//! one async task per agent).
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `wumpus-config.yaml` into
//!   strongly-typed structs.
//! - [`environment`] -- The seeded ground-truth world and its sensor and
//!   action port.
//! - [`report`] -- The end-of-run [`SimulationReport`].
//! - [`runner`] -- [`Simulation`] setup and the lockstep and concurrent loops.
//! - [`tick`] -- The lockstep tick cycle with per-agent mailboxes.
//!
//! [`SimulationReport`]: report::SimulationReport
//! [`Simulation`]: runner::Simulation

pub mod config;
pub mod environment;
pub mod report;
pub mod runner;
pub mod tick;
