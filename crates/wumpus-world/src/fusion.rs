//! Sensor fusion: folding one sensor reading into the belief map.
//!
//! Every update takes the agent's previous location (if it has one) and its
//! new location, and returns whether any tile changed. Callers use that flag
//! to decide whether the map is worth broadcasting.
//!
//! A negative reading, or a reading with no known previous location, is
//! applied to the full sensor neighborhood of `new`. A positive reading
//! after a move only implicates the half-plane the agent just stepped
//! towards: everything behind it was already in range before the move.

use tracing::trace;
use wumpus_types::{Direction, Location, Metric, Offset};

use crate::error::WorldError;
use crate::grid::{
    BREEZE_METRIC, BREEZE_RANGE, GLITTER_METRIC, GLITTER_RANGE, Grid, SMELL_METRIC, SMELL_RANGE,
    SMELL_SPREAD,
};
use crate::tile::Tile;

impl Grid {
    /// Apply a breeze reading taken at `new`.
    ///
    /// Does nothing if the agent has not moved.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `new` is off the map.
    pub fn update_breeze(
        &mut self,
        prev: Option<Location>,
        new: Location,
        reading: bool,
    ) -> Result<bool, WorldError> {
        self.try_tile(new)?;
        if prev == Some(new) {
            return Ok(false);
        }
        let dir = if reading { travel_direction(prev, new) } else { None };
        let cells = self.neighbors_in_direction(new, dir, BREEZE_RANGE, BREEZE_METRIC);
        let changed = self.apply(&cells, |t| t.set_breeze(reading));
        trace!(at = %new, reading, changed, "breeze fused");
        Ok(changed)
    }

    /// Apply a glitter reading taken at `new`.
    ///
    /// After a move, positive glitter can only come from the three cells
    /// ahead, left, and right of the direction of travel.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `new` is off the map.
    pub fn update_glitter(
        &mut self,
        prev: Option<Location>,
        new: Location,
        reading: bool,
    ) -> Result<bool, WorldError> {
        self.try_tile(new)?;
        if prev == Some(new) {
            return Ok(false);
        }
        let cells = match (reading, travel_direction(prev, new)) {
            (true, Some(dir)) => [dir, dir.turn_left(), dir.turn_right()]
                .into_iter()
                .map(|d| new.step(d))
                .filter(|l| self.contains(*l))
                .collect(),
            _ => self.neighbors(new, GLITTER_RANGE, GLITTER_METRIC),
        };
        let changed = self.apply(&cells, |t| t.set_glitter(reading));
        trace!(at = %new, reading, changed, "glitter fused");
        Ok(changed)
    }

    /// Apply a smell reading taken at `new`.
    ///
    /// A positive reading only marks cells that sit next to an obstruction
    /// that could be a monster; smell with nothing to explain it is not
    /// recorded. A negative reading clears smell around `new`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `new` is off the map.
    pub fn update_smell(
        &mut self,
        prev: Option<Location>,
        new: Location,
        reading: bool,
    ) -> Result<bool, WorldError> {
        self.try_tile(new)?;
        if !reading {
            let cells = self.neighbors(new, SMELL_SPREAD, SMELL_METRIC);
            let changed = self.apply(&cells, |t| t.set_smell(false));
            trace!(at = %new, reading, changed, "smell fused");
            return Ok(changed);
        }
        if prev == Some(new) {
            return Ok(false);
        }

        let candidates =
            self.neighbors_in_direction(new, travel_direction(prev, new), SMELL_RANGE, SMELL_METRIC);
        let mut smelly = Vec::new();
        for &cell in &candidates {
            let suspect = self.tile(cell).is_some_and(Tile::has_obstruction) && !self.is_wall(cell);
            if !suspect {
                continue;
            }
            smelly.extend(
                self.neighbors(cell, SMELL_SPREAD, SMELL_METRIC)
                    .into_iter()
                    .filter(|n| candidates.contains(n)),
            );
        }
        let changed = self.apply(&smelly, |t| t.set_smell(true));
        trace!(at = %new, reading, changed, "smell fused");
        Ok(changed)
    }

    /// Mark every sonar return as obstructed.
    ///
    /// Offsets are relative to `at`; returns that land off the map are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `at` is off the map.
    pub fn update_obstructions(&mut self, at: Location, sonar: &[Offset]) -> Result<bool, WorldError> {
        self.try_tile(at)?;
        let cells: Vec<Location> = sonar
            .iter()
            .map(|o| o.from(at))
            .filter(|l| self.contains(*l))
            .collect();
        let changed = self.apply(&cells, |t| t.set_obstruction(true));
        trace!(at = %at, returns = sonar.len(), changed, "sonar fused");
        Ok(changed)
    }

    /// Mark `at` and its four neighbors as searched.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `at` is off the map.
    pub fn update_searched(&mut self, at: Location) -> Result<bool, WorldError> {
        let mut changed = self.try_tile_mut(at)?.set_searched(true);
        let cells = self.neighbors(at, GLITTER_RANGE, Metric::Manhattan);
        changed |= self.apply(&cells, |t| t.set_searched(true));
        Ok(changed)
    }

    /// Mark `at` as visited.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `at` is off the map.
    pub fn update_visited(&mut self, at: Location) -> Result<bool, WorldError> {
        Ok(self.try_tile_mut(at)?.set_visited(true))
    }

    /// Run `f` over every tile in `cells`, reporting whether any call did.
    fn apply<F>(&mut self, cells: &[Location], mut f: F) -> bool
    where
        F: FnMut(&mut Tile) -> bool,
    {
        let mut changed = false;
        for &cell in cells {
            if let Some(tile) = self.tile_mut(cell) {
                changed |= f(tile);
            }
        }
        changed
    }
}

/// Direction of the step from `prev` to `new`, if there was one.
fn travel_direction(prev: Option<Location>, new: Location) -> Option<Direction> {
    prev.and_then(|p| p.direction_to(new))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(x: i32, y: i32) -> Location {
        Location::new(x, y)
    }

    fn breezy(grid: &Grid) -> Vec<Location> {
        grid.tiles()
            .filter(|t| t.has_breeze())
            .map(Tile::location)
            .collect()
    }

    #[test]
    fn breeze_without_history_marks_full_square() {
        let mut grid = Grid::new();
        assert!(grid.update_breeze(None, loc(10, 10), true).unwrap_or(false));
        assert_eq!(breezy(&grid).len(), 8);
    }

    #[test]
    fn breeze_after_move_marks_half_plane() {
        let mut grid = Grid::new();
        let changed = grid.update_breeze(Some(loc(10, 9)), loc(10, 10), true);
        assert_eq!(changed.ok(), Some(true));
        let marked = breezy(&grid);
        assert_eq!(marked.len(), 3);
        assert!(marked.iter().all(|l| l.y == 11));
    }

    #[test]
    fn breeze_is_skipped_without_movement() {
        let mut grid = Grid::new();
        let at = loc(10, 10);
        assert_eq!(grid.update_breeze(Some(at), at, true).ok(), Some(false));
        assert!(breezy(&grid).is_empty());
    }

    #[test]
    fn negative_breeze_clears_neighborhood() {
        let mut grid = Grid::new();
        assert!(grid.update_breeze(None, loc(10, 10), true).is_ok());
        assert_eq!(
            grid.update_breeze(Some(loc(10, 9)), loc(10, 10), false).ok(),
            Some(true)
        );
        assert!(breezy(&grid).is_empty());
        // A repeat reading changes nothing.
        assert_eq!(
            grid.update_breeze(Some(loc(10, 9)), loc(10, 10), false).ok(),
            Some(false)
        );
    }

    #[test]
    fn glitter_after_move_marks_three_cells() {
        let mut grid = Grid::new();
        assert!(grid.update_glitter(Some(loc(9, 10)), loc(10, 10), true).is_ok());
        let mut marked: Vec<Location> = grid
            .tiles()
            .filter(|t| t.has_glitter())
            .map(Tile::location)
            .collect();
        marked.sort();
        assert_eq!(marked, vec![loc(10, 9), loc(10, 11), loc(11, 10)]);
    }

    #[test]
    fn glitter_without_history_marks_four_neighbors() {
        let mut grid = Grid::new();
        assert!(grid.update_glitter(None, loc(1, 1), true).is_ok());
        let count = grid.tiles().filter(|t| t.has_glitter()).count();
        assert_eq!(count, 2);
    }

    #[test]
    fn smell_requires_a_suspect_obstruction() {
        let mut grid = Grid::new();
        assert_eq!(grid.update_smell(None, loc(10, 10), true).ok(), Some(false));

        assert!(grid.update_obstructions(loc(10, 10), &[Offset::new(2, 0)]).is_ok());
        assert_eq!(grid.update_smell(None, loc(10, 10), true).ok(), Some(true));

        let smelly: Vec<Location> = grid
            .tiles()
            .filter(|t| t.has_smell())
            .map(Tile::location)
            .collect();
        assert!(!smelly.is_empty());
        // Only cells around the suspect that are also in smelling range.
        for cell in &smelly {
            assert!(cell.x >= 11 && cell.x <= 12, "unexpected smell at {cell}");
            assert!(cell.y >= 9 && cell.y <= 11, "unexpected smell at {cell}");
        }
    }

    #[test]
    fn smell_ignores_known_walls() {
        let mut grid = Grid::new();
        assert!(grid.update_obstructions(loc(10, 10), &[Offset::new(2, 0)]).is_ok());
        // Standing next to the obstruction resolves it as a wall.
        assert!(grid.update_visited(loc(11, 11)).is_ok());
        assert!(grid.is_wall(loc(12, 10)));
        assert_eq!(grid.update_smell(None, loc(10, 10), true).ok(), Some(false));
    }

    #[test]
    fn negative_smell_clears_ring() {
        let mut grid = Grid::new();
        for cell in grid.neighbors(loc(10, 10), 1, Metric::Square) {
            if let Some(t) = grid.tile_mut(cell) {
                t.set_smell(true);
            }
        }
        assert_eq!(grid.update_smell(None, loc(10, 10), false).ok(), Some(true));
        assert!(grid.tiles().all(|t| !t.has_smell()));
    }

    #[test]
    fn sonar_offsets_are_relative_and_clipped() {
        let mut grid = Grid::new();
        let sonar = [Offset::new(1, 0), Offset::new(-3, 0), Offset::new(0, 2)];
        assert_eq!(grid.update_obstructions(loc(2, 2), &sonar).ok(), Some(true));
        assert!(grid.tile(loc(3, 2)).is_some_and(Tile::has_obstruction));
        assert!(grid.tile(loc(2, 4)).is_some_and(Tile::has_obstruction));
        let count = grid.tiles().filter(|t| t.has_obstruction()).count();
        assert_eq!(count, 2);
    }

    #[test]
    fn searched_covers_plus_shape() {
        let mut grid = Grid::new();
        assert_eq!(grid.update_searched(loc(10, 10)).ok(), Some(true));
        let count = grid.tiles().filter(|t| t.has_searched()).count();
        assert_eq!(count, 5);
        assert!(grid.tile(loc(11, 11)).is_some_and(|t| !t.has_searched()));
        assert_eq!(grid.update_searched(loc(10, 10)).ok(), Some(false));
    }

    #[test]
    fn visited_reports_first_visit_only() {
        let mut grid = Grid::new();
        assert_eq!(grid.update_visited(loc(4, 4)).ok(), Some(true));
        assert_eq!(grid.update_visited(loc(4, 4)).ok(), Some(false));
    }

    #[test]
    fn off_map_updates_are_errors() {
        let mut grid = Grid::new();
        let off = loc(0, 5);
        assert!(matches!(grid.update_visited(off), Err(WorldError::OutOfBounds(_))));
        assert!(grid.update_breeze(None, off, true).is_err());
        assert!(grid.update_searched(off).is_err());
    }

    #[test]
    fn travel_direction_follows_step() {
        assert_eq!(travel_direction(None, loc(3, 3)), None);
        assert_eq!(
            travel_direction(Some(loc(3, 3)), loc(3, 4)),
            Some(Direction::North)
        );
    }
}
