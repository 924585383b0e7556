//! Single-cell belief state.
//!
//! A [`Tile`] stores raw evidence flags for one grid coordinate. Callers
//! never see the raw flags: every getter applies the consistency rules
//! first, so a tile that has been visited can never read as smelly, and a
//! tile that reads as obstructed can never read as glittering.
//!
//! # Write policy
//!
//! Setters may always clear a flag. Setting a hazard or glitter flag back to
//! `true` is refused once the cell has been resolved (searched, and for
//! most flags also visited), so stale evidence from a sensor sweep or a
//! peer's map cannot resurrect a cell that has already been checked.
//!
//! Predicates that need the neighborhood (wall, monster, claimed) live on
//! [`Grid`](crate::grid::Grid).

use serde::{Deserialize, Serialize};
use wumpus_types::Location;

use crate::error::WorldError;

/// The cost of moving through any tile.
pub const TILE_COST: u32 = 1;

/// Belief state for one grid coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// The coordinate this tile describes.
    location: Location,
    /// An agent has stood here.
    visited: bool,
    /// An agent has sensed this cell up close.
    searched: bool,
    /// Sonar reported something solid here.
    obstruction: bool,
    /// A pit may be here.
    breeze: bool,
    /// A monster may be adjacent.
    smell: bool,
    /// Gold may be here.
    glitter: bool,
    /// Some agent has taken responsibility for the gold or monster here.
    claimed: bool,
}

impl Tile {
    /// Create an empty tile for `location`.
    pub const fn new(location: Location) -> Self {
        Self {
            location,
            visited: false,
            searched: false,
            obstruction: false,
            breeze: false,
            smell: false,
            glitter: false,
            claimed: false,
        }
    }

    /// The coordinate this tile describes.
    pub const fn location(&self) -> Location {
        self.location
    }

    // -------------------------------------------------------------------
    // Getters
    // -------------------------------------------------------------------

    /// Whether an agent has stood on this tile.
    pub const fn has_visited(&self) -> bool {
        self.visited
    }

    /// Whether this tile has been searched.
    pub const fn has_searched(&self) -> bool {
        self.searched
    }

    /// Whether something solid is believed to be here.
    ///
    /// A visited tile is passable by definition.
    pub const fn has_obstruction(&self) -> bool {
        self.obstruction && !self.visited
    }

    /// Whether a pit may be here.
    pub const fn has_breeze(&self) -> bool {
        self.breeze && !self.has_obstruction() && !self.visited
    }

    /// Whether a monster may be adjacent.
    pub const fn has_smell(&self) -> bool {
        self.smell && !self.has_obstruction() && !self.visited
    }

    /// Whether gold may be here.
    pub const fn has_glitter(&self) -> bool {
        self.glitter && !self.has_obstruction()
    }

    /// Whether stepping here could be fatal.
    pub const fn is_dangerous(&self) -> bool {
        self.has_breeze() || self.has_smell()
    }

    /// The stored claim mark, before the grid-level evidence check.
    pub(crate) const fn claim_mark(&self) -> bool {
        self.claimed
    }

    // -------------------------------------------------------------------
    // Setters
    // -------------------------------------------------------------------

    /// Set or clear the obstruction flag. Returns whether the flag changed.
    ///
    /// Refuses to set `true` on a searched or visited tile.
    pub fn set_obstruction(&mut self, value: bool) -> bool {
        let old = self.obstruction;
        if !(value && (self.searched || self.visited)) {
            self.obstruction = value;
        }
        old != self.obstruction
    }

    /// Set or clear the breeze flag. Returns whether the flag changed.
    ///
    /// Refuses any write while obstructed, and refuses to set `true` on a
    /// searched or visited tile.
    pub fn set_breeze(&mut self, value: bool) -> bool {
        let old = self.breeze;
        if !self.has_obstruction() && !(value && (self.searched || self.visited)) {
            self.breeze = value;
        }
        old != self.breeze
    }

    /// Set or clear the smell flag. Returns whether the flag changed.
    ///
    /// Same write policy as [`Tile::set_breeze`]. Clearing a smell that was
    /// set also clears `searched`, so the cell gets looked at again.
    pub fn set_smell(&mut self, value: bool) -> bool {
        let old = self.smell;
        if !self.has_obstruction() && !(value && (self.searched || self.visited)) {
            self.smell = value;
            if old && !self.smell {
                self.searched = false;
            }
        }
        old != self.smell
    }

    /// Set or clear the glitter flag. Returns whether the flag changed.
    ///
    /// Refuses any write while obstructed, and refuses to set `true` on a
    /// searched tile.
    pub fn set_glitter(&mut self, value: bool) -> bool {
        let old = self.glitter;
        if !self.has_obstruction() && !(value && self.searched) {
            self.glitter = value;
        }
        old != self.glitter
    }

    /// Set or clear the searched flag. Returns whether the flag changed.
    pub fn set_searched(&mut self, value: bool) -> bool {
        let old = self.searched;
        self.searched = value;
        old != self.searched
    }

    /// Mark the tile visited. Returns whether the flag changed.
    ///
    /// `visited` never goes back to `false`; passing `false` is a no-op.
    pub fn set_visited(&mut self, value: bool) -> bool {
        if value && !self.visited {
            self.visited = true;
            return true;
        }
        false
    }

    /// Overwrite the stored claim mark.
    pub(crate) fn set_claim_mark(&mut self, value: bool) -> bool {
        let old = self.claimed;
        self.claimed = value;
        old != self.claimed
    }

    // -------------------------------------------------------------------
    // Merge
    // -------------------------------------------------------------------

    /// Fold another belief about the same coordinate into this one.
    ///
    /// If this tile is unsearched and `other` is searched, `other` is the
    /// better-informed source and its state is adopted wholesale, except
    /// that a visit recorded here is never forgotten. Otherwise the merge
    /// only ever adds certainty: `visited`, `searched`, `obstruction`, and
    /// the claim mark are OR-ed in through the sanitizing setters.
    ///
    /// The claim mark is taken from `other` as stored. Whether a claim is
    /// still live depends on the neighborhood (a monster is inferred, not
    /// stored), so filtering a peer's stale claims is left to
    /// [`Grid::merge_from`](crate::grid::Grid::merge_from), which clears the
    /// incoming mark unless [`Grid::is_claimed`](crate::grid::Grid::is_claimed)
    /// holds on the peer's map.
    ///
    /// Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TileMismatch`] if the tiles describe different
    /// coordinates.
    pub fn merge_from(&mut self, other: &Self) -> Result<bool, WorldError> {
        if self.location != other.location {
            return Err(WorldError::TileMismatch {
                expected: self.location,
                found: other.location,
            });
        }

        let before = self.clone();
        if !self.has_searched() && other.has_searched() {
            self.breeze = other.breeze;
            self.glitter = other.glitter;
            self.obstruction = other.obstruction;
            self.searched = other.searched;
            self.smell = other.smell;
            self.claimed = other.claimed;
            self.set_visited(other.has_visited());
        } else {
            if other.has_visited() {
                self.set_visited(true);
            }
            if other.has_searched() {
                self.set_searched(true);
            }
            if other.has_obstruction() {
                self.set_obstruction(true);
            }
            if other.claimed {
                self.claimed = true;
            }
        }
        Ok(*self != before)
    }
}
