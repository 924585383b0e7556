//! Belief map, sensor fusion, and pathfinding for the Wumpus World explorer.
//!
//! Each agent owns one [`Grid`]: a fixed rectangle of [`Tile`]s holding what
//! the agent believes about every cell. Sensor readings are folded in
//! through the `update_*` operations, peers' maps through
//! [`Grid::merge_from`], and the [`Navigator`] plans safe routes over the
//! result.
//!
//! # Modules
//!
//! - [`error`] -- Error types for map operations.
//! - [`tile`] -- Single-cell belief state with its consistency rules.
//! - [`grid`] -- The map itself: neighborhoods, derived predicates, searches,
//!   and merging.
//! - [`fusion`] -- Folding breeze, smell, glitter, and sonar readings into
//!   the map.
//! - [`navigator`] -- A* over 4-connected safe cells.

pub mod error;
pub mod fusion;
pub mod grid;
pub mod navigator;
pub mod tile;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use grid::{
    BREEZE_METRIC, BREEZE_RANGE, GLITTER_METRIC, GLITTER_RANGE, Grid, InferenceConfig,
    SMELL_METRIC, SMELL_RANGE, SMELL_SPREAD, SONAR_METRIC, SONAR_RANGE,
};
pub use navigator::Navigator;
pub use tile::{TILE_COST, Tile};
