//! The belief map: one [`Tile`] per coordinate plus neighborhood queries.
//!
//! The [`Grid`] is the agent's picture of the world. It answers spatial
//! questions (who are my neighbors, what lies between two cells, where is
//! the nearest unexplored cell) and derives the predicates that need more
//! than one tile to decide: whether an obstruction is a wall or a monster,
//! and whether a claim still stands.
//!
//! Sensor fusion lives in [`crate::fusion`] as further `impl Grid` blocks.
//!
//! # Inference thresholds
//!
//! Whether an obstruction is a monster is a judgment call from indirect
//! evidence. The two thresholds in [`InferenceConfig`] were tuned by hand:
//!
//! | Threshold           | Default | Meaning                                              |
//! |---------------------|---------|------------------------------------------------------|
//! | `wall_threshold`    | 2       | this many obstructed 4-neighbors means "wall"        |
//! | `monster_threshold` | 4       | this many smelly cells around it means "monster"     |

use serde::{Deserialize, Serialize};
use wumpus_types::{Bounds, Direction, Location, Metric};

use crate::error::WorldError;
use crate::tile::Tile;

// ---------------------------------------------------------------------------
// Sensor ranges
// ---------------------------------------------------------------------------

/// Radius at which a pit produces a breeze.
pub const BREEZE_RANGE: u32 = 1;

/// Metric for [`BREEZE_RANGE`].
pub const BREEZE_METRIC: Metric = Metric::Square;

/// Radius at which gold can be seen glittering.
pub const GLITTER_RANGE: u32 = 1;

/// Metric for [`GLITTER_RANGE`].
pub const GLITTER_METRIC: Metric = Metric::Manhattan;

/// Radius at which a monster can be smelled.
pub const SMELL_RANGE: u32 = 2;

/// Metric for [`SMELL_RANGE`].
pub const SMELL_METRIC: Metric = Metric::Square;

/// Radius around a monster whose cells carry its smell.
pub const SMELL_SPREAD: u32 = SMELL_RANGE.saturating_sub(1);

/// Radius the sonar can see obstructions at.
pub const SONAR_RANGE: u32 = 5;

/// Metric for [`SONAR_RANGE`].
pub const SONAR_METRIC: Metric = Metric::Manhattan;

// ---------------------------------------------------------------------------
// Inference configuration
// ---------------------------------------------------------------------------

/// Tunable thresholds for telling walls from monsters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Obstructed 4-neighbors at which an obstruction is taken for a wall.
    #[serde(default = "default_wall_threshold")]
    pub wall_threshold: usize,

    /// Smelly cells around an obstruction at which it is taken for a monster.
    #[serde(default = "default_monster_threshold")]
    pub monster_threshold: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            wall_threshold: default_wall_threshold(),
            monster_threshold: default_monster_threshold(),
        }
    }
}

const fn default_wall_threshold() -> usize {
    2
}

const fn default_monster_threshold() -> usize {
    4
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// An agent's belief map of the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    /// Extent of the map.
    bounds: Bounds,
    /// Inference thresholds used by the derived predicates.
    inference: InferenceConfig,
    /// Tiles in column-major order, see [`Bounds::index_of`].
    tiles: Vec<Tile>,
}

impl Grid {
    /// Create an empty map of the standard 47x26 world.
    pub fn new() -> Self {
        Self::with_bounds(Bounds::STANDARD, InferenceConfig::default())
    }

    /// Create an empty map with custom extent and thresholds.
    pub fn with_bounds(bounds: Bounds, inference: InferenceConfig) -> Self {
        let tiles = bounds.locations().map(Tile::new).collect();
        Self {
            bounds,
            inference,
            tiles,
        }
    }

    /// The extent of this map.
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The inference thresholds in use.
    pub const fn inference(&self) -> InferenceConfig {
        self.inference
    }

    /// Whether `loc` lies on the map.
    pub const fn contains(&self, loc: Location) -> bool {
        self.bounds.contains(loc)
    }

    /// The tile at `loc`, if it is on the map.
    pub fn tile(&self, loc: Location) -> Option<&Tile> {
        self.bounds.index_of(loc).and_then(|i| self.tiles.get(i))
    }

    /// Mutable access to the tile at `loc`, if it is on the map.
    pub fn tile_mut(&mut self, loc: Location) -> Option<&mut Tile> {
        self.bounds.index_of(loc).and_then(|i| self.tiles.get_mut(i))
    }

    /// The tile at `loc`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `loc` is not on the map.
    pub fn try_tile(&self, loc: Location) -> Result<&Tile, WorldError> {
        self.tile(loc).ok_or(WorldError::OutOfBounds(loc))
    }

    /// Mutable access to the tile at `loc`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `loc` is not on the map.
    pub fn try_tile_mut(&mut self, loc: Location) -> Result<&mut Tile, WorldError> {
        self.tile_mut(loc).ok_or(WorldError::OutOfBounds(loc))
    }

    /// The tile one step from `loc` in `dir`, if it is on the map.
    pub fn tile_in_direction(&self, loc: Location, dir: Direction) -> Option<&Tile> {
        self.tile(loc.step(dir))
    }

    /// Iterate every tile.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    // -------------------------------------------------------------------
    // Neighborhoods
    // -------------------------------------------------------------------

    /// All on-map cells within `range` of `origin` under `metric`,
    /// excluding `origin` itself.
    pub fn neighbors(&self, origin: Location, range: u32, metric: Metric) -> Vec<Location> {
        let r = signed_range(range);
        let neg = r.saturating_neg();
        self.neighbors_in_window(origin, range, metric, (neg, r), (neg, r))
    }

    /// Like [`Grid::neighbors`], restricted to the half-plane strictly ahead
    /// of `origin` in `dir`.
    ///
    /// With no direction this is the full neighborhood.
    pub fn neighbors_in_direction(
        &self,
        origin: Location,
        dir: Option<Direction>,
        range: u32,
        metric: Metric,
    ) -> Vec<Location> {
        let r = signed_range(range);
        let neg = r.saturating_neg();
        let (xs, ys) = match dir {
            None => return self.neighbors(origin, range, metric),
            Some(Direction::North) => ((neg, r), (1, r)),
            Some(Direction::South) => ((neg, r), (neg, -1)),
            Some(Direction::East) => ((1, r), (neg, r)),
            Some(Direction::West) => ((neg, -1), (neg, r)),
        };
        self.neighbors_in_window(origin, range, metric, xs, ys)
    }

    /// Cells whose offset from `origin` lies inside the `xs` by `ys` window
    /// and within `range` under `metric`.
    fn neighbors_in_window(
        &self,
        origin: Location,
        range: u32,
        metric: Metric,
        xs: (i32, i32),
        ys: (i32, i32),
    ) -> Vec<Location> {
        let mut out = Vec::new();
        if range == 0 {
            return out;
        }
        for dx in xs.0..=xs.1 {
            for dy in ys.0..=ys.1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if !metric.within(dx, dy, range) {
                    continue;
                }
                let loc = origin.offset(dx, dy);
                if self.contains(loc) {
                    out.push(loc);
                }
            }
        }
        out
    }

    /// Cells strictly between `from` and `to` along their shared row or
    /// column, ordered from `from`. Empty if the two are not in line or
    /// are the same cell.
    pub fn tiles_between(&self, from: Location, to: Location) -> Vec<Location> {
        let mut out = Vec::new();
        if from == to || !from.in_line(to) {
            return out;
        }
        let Some(dir) = from.direction_to(to) else {
            return out;
        };
        let mut next = from.step(dir);
        while next != to && self.contains(next) {
            out.push(next);
            next = next.step(dir);
        }
        out
    }

    /// Whether any cell strictly between `from` and `to` is obstructed.
    pub fn is_obstruction_between(&self, from: Location, to: Location) -> bool {
        self.tiles_between(from, to)
            .into_iter()
            .any(|loc| self.tile(loc).is_some_and(Tile::has_obstruction))
    }

    /// Whether every 4-neighbor of `loc` is obstructed or dangerous.
    pub fn is_surrounded(&self, loc: Location) -> bool {
        self.neighbors(loc, 1, Metric::Manhattan)
            .into_iter()
            .filter_map(|n| self.tile(n))
            .all(|t| t.has_obstruction() || t.is_dangerous())
    }

    // -------------------------------------------------------------------
    // Derived predicates
    // -------------------------------------------------------------------

    /// Whether the obstruction at `loc` is known to be a wall.
    ///
    /// An obstruction is a wall once its cell has been searched, or once an
    /// agent has stood within [`SMELL_SPREAD`] of it without smelling it
    /// out as a monster.
    pub fn is_wall(&self, loc: Location) -> bool {
        let Some(tile) = self.tile(loc) else {
            return false;
        };
        if !tile.has_obstruction() {
            return false;
        }
        if tile.has_searched() {
            return true;
        }
        self.neighbors(loc, SMELL_SPREAD, SMELL_METRIC)
            .into_iter()
            .filter_map(|n| self.tile(n))
            .any(Tile::has_visited)
    }

    /// Best guess whether a monster occupies `loc`.
    ///
    /// Can give false positives on incomplete evidence.
    pub fn is_monster(&self, loc: Location) -> bool {
        let Some(tile) = self.tile(loc) else {
            return false;
        };
        if !tile.has_obstruction() || self.is_wall(loc) {
            return false;
        }

        // Too many obstructed 4-neighbors: probably part of a wall.
        let obstructed = self
            .neighbors(loc, 1, Metric::Manhattan)
            .into_iter()
            .filter_map(|n| self.tile(n))
            .filter(|t| t.has_obstruction())
            .count();
        if obstructed >= self.inference.wall_threshold {
            return false;
        }

        let smelly = self
            .neighbors(loc, SMELL_SPREAD, SMELL_METRIC)
            .into_iter()
            .filter_map(|n| self.tile(n))
            .filter(|t| t.has_smell())
            .count();
        smelly >= self.inference.monster_threshold
    }

    /// Whether a claim on `loc` still stands: the cell must be marked and
    /// still show gold or a monster.
    pub fn is_claimed(&self, loc: Location) -> bool {
        self.tile(loc).is_some_and(|t| {
            t.claim_mark() && (t.has_glitter() || self.is_monster(loc))
        })
    }

    /// Whether stepping onto `loc` could be fatal. Off-map cells are not.
    pub fn is_dangerous(&self, loc: Location) -> bool {
        self.tile(loc).is_some_and(Tile::is_dangerous)
    }

    /// Whether an agent could usefully walk to `loc` to search it.
    pub fn is_searchable(&self, loc: Location) -> bool {
        self.tile(loc)
            .is_some_and(|t| !t.has_searched() && !t.has_obstruction() && !t.is_dangerous())
    }

    /// Whether an agent may step onto `loc` according to current beliefs.
    pub fn is_passable(&self, loc: Location) -> bool {
        self.tile(loc)
            .is_some_and(|t| !t.has_obstruction() && !t.is_dangerous())
    }

    // -------------------------------------------------------------------
    // Claims and corrections
    // -------------------------------------------------------------------

    /// Mark `loc` as claimed so no one else acts on it.
    ///
    /// The mark only sticks while the cell shows gold or a monster.
    /// Returns whether the stored mark changed.
    pub fn claim(&mut self, loc: Location) -> bool {
        let holds = self.tile(loc).is_some_and(Tile::has_glitter) || self.is_monster(loc);
        self.tile_mut(loc)
            .is_some_and(|t| t.set_claim_mark(holds))
    }

    /// Record that `loc` cannot be reached from `agent_at`.
    ///
    /// Unless the agent is boxed in (in which case the fault is its own
    /// position), a searchable, unvisited cell that no path reaches is
    /// re-labelled as an obstruction so it stops attracting searches.
    /// Returns whether anything changed.
    pub fn mark_unreachable(&mut self, agent_at: Location, loc: Location) -> bool {
        if self.is_surrounded(agent_at) || !self.is_searchable(loc) {
            return false;
        }
        let Some(tile) = self.tile_mut(loc) else {
            return false;
        };
        if tile.has_visited() {
            return false;
        }
        let mut changed = tile.set_searched(false);
        changed |= tile.set_obstruction(true);
        changed
    }

    // -------------------------------------------------------------------
    // Searches
    // -------------------------------------------------------------------

    /// The nearest safe, unobstructed, unsearched cell to `from`, by
    /// distance then `x` then `y`. `None` once the map is fully searched.
    pub fn find_nearest_unsearched_location(&self, from: Location) -> Option<Location> {
        self.tiles
            .iter()
            .filter(|t| !t.has_searched() && !t.has_obstruction() && !t.is_dangerous())
            .map(Tile::location)
            .min_by_key(|loc| loc.proximity_key(from))
    }

    /// Every unclaimed, safe, glittering cell, nearest first.
    pub fn find_gold(&self, from: Location) -> Vec<Location> {
        let mut found: Vec<Location> = self
            .tiles
            .iter()
            .filter(|t| t.has_glitter() && !t.is_dangerous())
            .map(Tile::location)
            .filter(|&loc| !self.is_claimed(loc))
            .collect();
        found.sort_by_key(|loc| loc.proximity_key(from));
        found
    }

    /// Every unclaimed suspected monster, nearest first.
    pub fn find_monsters(&self, from: Location) -> Vec<Location> {
        let mut found: Vec<Location> = self
            .tiles
            .iter()
            .map(Tile::location)
            .filter(|&loc| self.is_monster(loc) && !self.is_claimed(loc))
            .collect();
        found.sort_by_key(|loc| loc.proximity_key(from));
        found
    }

    // -------------------------------------------------------------------
    // Merge and statistics
    // -------------------------------------------------------------------

    /// Fold a peer's map into this one, tile by tile.
    ///
    /// Claims are carried over only where they still stand on the peer's
    /// map. Returns whether any tile changed.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::BoundsMismatch`] if the maps have different
    /// extents, or [`WorldError::TileMismatch`] if their tiles are laid out
    /// differently.
    pub fn merge_from(&mut self, other: &Self) -> Result<bool, WorldError> {
        if self.bounds != other.bounds {
            return Err(WorldError::BoundsMismatch {
                expected: self.bounds,
                found: other.bounds,
            });
        }
        let mut changed = false;
        for (mine, theirs) in self.tiles.iter_mut().zip(other.tiles.iter()) {
            let mut incoming = theirs.clone();
            incoming.set_claim_mark(other.is_claimed(theirs.location()));
            changed |= mine.merge_from(&incoming)?;
        }
        Ok(changed)
    }

    /// Number of tiles that have been searched or visited.
    pub fn explored_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|t| t.has_searched() || t.has_visited())
            .count()
    }

    /// Number of tiles on the map.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a radius into the signed coordinate domain.
fn signed_range(range: u32) -> i32 {
    i32::try_from(range).unwrap_or(i32::MAX)
}
