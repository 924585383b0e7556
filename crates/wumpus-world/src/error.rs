//! Error types for the `wumpus-world` crate.
//!
//! Every variant here signals a programming defect (a caller asked about a
//! cell that does not exist, or tried to fold together beliefs about two
//! different cells). Unreachable destinations and fully-searched maps are
//! not errors; those come back as `None`.

use wumpus_types::{Bounds, Location};

/// Errors that can occur during belief-map operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A location outside the grid was used where an in-bounds cell is required.
    #[error("location {0} is outside the grid")]
    OutOfBounds(Location),

    /// Two tiles describing different coordinates were merged.
    #[error("cannot merge tile at {found} into tile at {expected}")]
    TileMismatch {
        /// Coordinate of the receiving tile.
        expected: Location,
        /// Coordinate of the incoming tile.
        found: Location,
    },

    /// Two grids with different extents were merged.
    #[error("cannot merge grid of {found:?} into grid of {expected:?}")]
    BoundsMismatch {
        /// Extent of the receiving grid.
        expected: Bounds,
        /// Extent of the incoming grid.
        found: Bounds,
    },
}
