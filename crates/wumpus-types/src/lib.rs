//! Shared type definitions for the Wumpus World explorer.
//!
//! This crate is the single source of truth for the plain data types that
//! every other crate in the workspace passes around: coordinates, compass
//! directions, distance metrics, roles, task status, and identifiers.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents and tasks
//! - [`enums`] -- Roles, task status, and agent kinds
//! - [`location`] -- Coordinates, bounds, directions, and distance helpers
//! - [`perception`] -- Sensor kinds and the readings an agent collects

pub mod enums;
pub mod ids;
pub mod location;
pub mod perception;

// Re-export all public types at crate root for convenience.
pub use enums::{AgentKind, Role, TaskStatus};
pub use ids::{AgentId, TaskId};
pub use location::{Bounds, Direction, Location, MAX_X, MAX_Y, MIN_COORD, Metric, Offset};
pub use perception::{Percept, Sensor};
