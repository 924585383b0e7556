//! Grid coordinates, compass directions, and distance helpers.
//!
//! Everything that reasons about positions (tile fusion, pathfinding, task
//! ranking) shares the helpers in this module so that "nearest" means the
//! same thing everywhere: Manhattan distance first, then `x`, then `y`.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Exclusive upper bound of the x axis for the standard world.
pub const MAX_X: i32 = 47;

/// Exclusive upper bound of the y axis for the standard world.
pub const MAX_Y: i32 = 26;

/// The lowest valid coordinate on either axis.
pub const MIN_COORD: i32 = 1;

/// Rectangular extent of a grid.
///
/// Valid coordinates satisfy `1 <= x < max_x` and `1 <= y < max_y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    /// Exclusive upper bound on x.
    pub max_x: i32,
    /// Exclusive upper bound on y.
    pub max_y: i32,
}

impl Bounds {
    /// The standard 47x26 world.
    pub const STANDARD: Self = Self {
        max_x: MAX_X,
        max_y: MAX_Y,
    };

    /// Create bounds with the given exclusive maxima.
    pub const fn new(max_x: i32, max_y: i32) -> Self {
        Self { max_x, max_y }
    }

    /// Whether the location lies inside these bounds.
    pub const fn contains(&self, loc: Location) -> bool {
        loc.x >= MIN_COORD && loc.x < self.max_x && loc.y >= MIN_COORD && loc.y < self.max_y
    }

    /// Number of usable columns.
    pub fn width(&self) -> usize {
        usable_span(self.max_x)
    }

    /// Number of usable rows.
    pub fn height(&self) -> usize {
        usable_span(self.max_y)
    }

    /// Total number of usable cells.
    pub fn cell_count(&self) -> usize {
        self.width().saturating_mul(self.height())
    }

    /// Dense index of `loc`, column-major, or `None` when out of bounds.
    pub fn index_of(&self, loc: Location) -> Option<usize> {
        if !self.contains(loc) {
            return None;
        }
        let col = usize::try_from(loc.x.checked_sub(MIN_COORD)?).ok()?;
        let row = usize::try_from(loc.y.checked_sub(MIN_COORD)?).ok()?;
        col.checked_mul(self.height())?.checked_add(row)
    }

    /// Iterate every usable location, column by column.
    pub fn locations(&self) -> impl Iterator<Item = Location> + use<> {
        let max_y = self.max_y;
        (MIN_COORD..self.max_x)
            .flat_map(move |x| (MIN_COORD..max_y).map(move |y| Location::new(x, y)))
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Count of coordinates in `[MIN_COORD, max)`, zero for degenerate bounds.
fn usable_span(max: i32) -> usize {
    usize::try_from(max.saturating_sub(MIN_COORD)).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// One of the four cardinal directions.
///
/// North increases `y`, East increases `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards larger `y`.
    North,
    /// Towards larger `x`.
    East,
    /// Towards smaller `y`.
    South,
    /// Towards smaller `x`.
    West,
}

impl Direction {
    /// All four directions, clockwise from North.
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// The direction 90 degrees counter-clockwise.
    pub const fn turn_left(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// The direction 90 degrees clockwise.
    pub const fn turn_right(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Unit step `(dx, dy)` for this direction.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::North => (0, 1),
            Self::East => (1, 0),
            Self::South => (0, -1),
            Self::West => (-1, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// Metric
// ---------------------------------------------------------------------------

/// Distance metric used for neighborhood queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// `|dx| + |dy| <= range`.
    Manhattan,
    /// `max(|dx|, |dy|) <= range` (the bounding square).
    Square,
}

impl Metric {
    /// Whether the offset `(dx, dy)` lies within `range` under this metric.
    pub const fn within(self, dx: i32, dy: i32, range: u32) -> bool {
        match self {
            Self::Manhattan => {
                let sum = dx.unsigned_abs().saturating_add(dy.unsigned_abs());
                sum <= range
            }
            Self::Square => dx.unsigned_abs() <= range && dy.unsigned_abs() <= range,
        }
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// An immutable grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Location {
    /// Create a location.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to `other`.
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }

    /// The location one step away in `dir`.
    pub const fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        self.offset(dx, dy)
    }

    /// The location displaced by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Whether the two locations share a row or a column.
    pub const fn in_line(self, other: Self) -> bool {
        self.x == other.x || self.y == other.y
    }

    /// Direction to travel from `self` towards `to`.
    ///
    /// The longer axis wins; ties go to the x axis. Returns `None` when the
    /// locations are identical.
    pub const fn direction_to(self, to: Self) -> Option<Direction> {
        let dx = to.x.saturating_sub(self.x);
        let dy = to.y.saturating_sub(self.y);
        if dx.unsigned_abs() >= dy.unsigned_abs() {
            if dx > 0 {
                Some(Direction::East)
            } else if dx < 0 {
                Some(Direction::West)
            } else {
                None
            }
        } else if dy > 0 {
            Some(Direction::North)
        } else {
            Some(Direction::South)
        }
    }

    /// Sort key used for every "nearest first" ordering in the workspace:
    /// distance from `origin`, then `x`, then `y`.
    ///
    /// Two keys are equal only when the locations are identical.
    pub const fn proximity_key(self, origin: Self) -> (u32, i32, i32) {
        (origin.manhattan(self), self.x, self.y)
    }

    /// Total order of `a` against `b` by proximity to `origin`.
    pub fn cmp_from(origin: Self, a: Self, b: Self) -> Ordering {
        a.proximity_key(origin).cmp(&b.proximity_key(origin))
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A displacement relative to an agent's position, as reported by sonar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offset {
    /// Horizontal displacement.
    pub dx: i32,
    /// Vertical displacement.
    pub dy: i32,
}

impl Offset {
    /// Create an offset.
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Resolve the offset against an absolute origin.
    pub const fn from(self, origin: Location) -> Location {
        origin.offset(self.dx, self.dy)
    }
}
