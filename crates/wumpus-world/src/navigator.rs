//! A* pathfinding over the belief map.
//!
//! Moves are 4-connected with a uniform cost of [`TILE_COST`] and the
//! heuristic is Manhattan distance, which is admissible for that move set.
//! Hazard knowledge is read live from the [`Grid`] on every expansion, so a
//! path always reflects the map as it stands at the time of the call.
//!
//! Both the open and the closed set are ordered sets keyed by
//! `(cost + heuristic, x, y)`, which gives a deterministic expansion order
//! for equal-cost frontiers.

use std::collections::BTreeSet;

use wumpus_types::{Bounds, Direction, Location, Metric};

use crate::grid::Grid;
use crate::tile::TILE_COST;

/// Per-cell search bookkeeping. Reset before every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Node {
    cost: u32,
    heuristic: u32,
    parent: Option<Location>,
}

impl Node {
    const FRESH: Self = Self {
        cost: TILE_COST,
        heuristic: 0,
        parent: None,
    };
}

/// Ordered-set key for a node.
type Key = (u32, i32, i32);

/// Reusable A* path planner.
///
/// Holds one search node per cell; every call to [`Navigator::find_path`]
/// resets them, so a single navigator can serve an agent for its lifetime.
#[derive(Debug, Clone)]
pub struct Navigator {
    bounds: Bounds,
    nodes: Vec<Node>,
}

impl Navigator {
    /// Create a navigator for maps of the given extent.
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            nodes: vec![Node::FRESH; bounds.cell_count()],
        }
    }

    /// Shortest safe path from `from` to `to`.
    ///
    /// The returned cells run from the first step to `to` inclusive; the
    /// start cell is not included. Standing on an in-bounds target always
    /// gives an empty path, whatever the map believes about that cell.
    /// Otherwise returns `None` when the target is obstructed, dangerous, off
    /// the map, or cannot be reached through safe cells.
    pub fn find_path(&mut self, grid: &Grid, from: Location, to: Location) -> Option<Vec<Location>> {
        if from == to {
            return grid.contains(from).then(Vec::new);
        }
        if !grid.is_passable(to) || !grid.contains(from) {
            return None;
        }

        if grid.bounds() != self.bounds {
            *self = Self::new(grid.bounds());
        }
        self.reset();

        let mut open: BTreeSet<Key> = BTreeSet::new();
        let mut closed: BTreeSet<Key> = BTreeSet::new();
        open.insert(self.key(from)?);

        while let Some(current_key) = open.pop_first() {
            let current = Location::new(current_key.1, current_key.2);
            if current == to {
                break;
            }
            closed.insert(current_key);

            let current_cost = self.node(current)?.cost;
            let next_cost = current_cost.saturating_add(TILE_COST);

            for neighbor in grid.neighbors(current, 1, Metric::Manhattan) {
                if !grid.is_passable(neighbor) {
                    continue;
                }
                let neighbor_key = self.key(neighbor)?;

                // A cheaper route re-opens the node for evaluation.
                if next_cost < self.node(neighbor)?.cost {
                    open.remove(&neighbor_key);
                    closed.remove(&neighbor_key);
                }
                if open.contains(&neighbor_key) || closed.contains(&neighbor_key) {
                    continue;
                }

                let node = self.node_mut(neighbor)?;
                node.cost = next_cost;
                node.heuristic = neighbor.manhattan(to);
                node.parent = Some(current);
                open.insert(self.key(neighbor)?);
            }
        }

        self.reconstruct(from, to)
    }

    /// Direction of the first step on the path from `from` to `to`.
    ///
    /// `None` when already there or when no path exists.
    pub fn next_direction(&mut self, grid: &Grid, from: Location, to: Location) -> Option<Direction> {
        let path = self.find_path(grid, from, to)?;
        let first = path.first()?;
        from.direction_to(*first)
    }

    /// Follow parent links back from `to`.
    fn reconstruct(&self, from: Location, to: Location) -> Option<Vec<Location>> {
        let mut path = Vec::new();
        let mut current = to;
        // Every cell appears at most once on a path.
        for _ in 0..self.nodes.len() {
            if current == from {
                path.reverse();
                return Some(path);
            }
            let parent = self.node(current)?.parent?;
            path.push(current);
            current = parent;
        }
        None
    }

    fn reset(&mut self) {
        for node in &mut self.nodes {
            *node = Node::FRESH;
        }
    }

    fn node(&self, loc: Location) -> Option<&Node> {
        self.bounds.index_of(loc).and_then(|i| self.nodes.get(i))
    }

    fn node_mut(&mut self, loc: Location) -> Option<&mut Node> {
        self.bounds.index_of(loc).and_then(|i| self.nodes.get_mut(i))
    }

    fn key(&self, loc: Location) -> Option<Key> {
        let node = self.node(loc)?;
        Some((node.cost.saturating_add(node.heuristic), loc.x, loc.y))
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Bounds::STANDARD)
    }
}

#[cfg(test)]
mod tests {
    use wumpus_types::Offset;

    use super::*;
    use crate::grid::InferenceConfig;

    fn loc(x: i32, y: i32) -> Location {
        Location::new(x, y)
    }

    fn assert_contiguous(from: Location, path: &[Location]) {
        let mut prev = from;
        for &step in path {
            assert_eq!(prev.manhattan(step), 1, "{prev} -> {step} is not a single step");
            prev = step;
        }
    }

    #[test]
    fn same_cell_gives_empty_path() {
        let grid = Grid::new();
        let mut nav = Navigator::default();
        assert_eq!(nav.find_path(&grid, loc(4, 4), loc(4, 4)), Some(Vec::new()));
        assert_eq!(nav.next_direction(&grid, loc(4, 4), loc(4, 4)), None);
    }

    #[test]
    fn same_cell_gives_empty_path_even_when_unsafe() {
        let mut grid = Grid::new();
        let blocked = loc(4, 4);
        let breezy = loc(9, 2);
        if let Some(t) = grid.tile_mut(blocked) {
            t.set_obstruction(true);
        }
        if let Some(t) = grid.tile_mut(breezy) {
            t.set_breeze(true);
        }
        let mut nav = Navigator::default();
        assert_eq!(nav.find_path(&grid, blocked, blocked), Some(Vec::new()));
        assert_eq!(nav.find_path(&grid, breezy, breezy), Some(Vec::new()));
        // Off the map there is no cell to stand on.
        assert_eq!(nav.find_path(&grid, loc(0, 0), loc(0, 0)), None);
    }

    #[test]
    fn obstructed_target_is_unreachable() {
        let mut grid = Grid::new();
        assert!(grid.update_obstructions(loc(5, 5), &[Offset::new(0, 0)]).is_ok());
        let mut nav = Navigator::default();
        assert_eq!(nav.find_path(&grid, loc(1, 1), loc(5, 5)), None);
    }

    #[test]
    fn dangerous_target_is_unreachable() {
        let mut grid = Grid::new();
        if let Some(t) = grid.tile_mut(loc(5, 5)) {
            t.set_breeze(true);
        }
        let mut nav = Navigator::default();
        assert_eq!(nav.find_path(&grid, loc(1, 1), loc(5, 5)), None);
    }

    #[test]
    fn enclosed_target_is_unreachable() {
        let mut grid = Grid::new();
        let target = loc(10, 10);
        let ring = [
            Offset::new(0, 1),
            Offset::new(0, -1),
            Offset::new(1, 0),
            Offset::new(-1, 0),
        ];
        assert_eq!(grid.update_obstructions(target, &ring).ok(), Some(true));
        let mut nav = Navigator::default();
        assert_eq!(nav.find_path(&grid, loc(1, 1), target), None);
    }

    #[test]
    fn straight_corridor() {
        let grid = Grid::new();
        let mut nav = Navigator::default();
        let from = loc(3, 3);
        let to = loc(8, 3);
        let path = nav.find_path(&grid, from, to).unwrap_or_default();
        assert_eq!(path.len(), 5);
        assert_eq!(path.last(), Some(&to));
        assert_contiguous(from, &path);
        assert_eq!(nav.next_direction(&grid, from, to), Some(Direction::East));
    }

    #[test]
    fn detours_around_obstructions() {
        let mut grid = Grid::new();
        // A wall across x = 5 from y = 1 to y = 5.
        for y in 1..=5 {
            if let Some(t) = grid.tile_mut(loc(5, y)) {
                t.set_obstruction(true);
            }
        }
        let mut nav = Navigator::default();
        let from = loc(3, 3);
        let to = loc(7, 3);
        let path = nav.find_path(&grid, from, to).unwrap_or_default();
        assert_contiguous(from, &path);
        assert_eq!(path.last(), Some(&to));
        assert!(path.iter().all(|l| grid.is_passable(*l)));
        // Around the top of the wall: 3 up, 4 across, 3 down.
        assert_eq!(path.len(), 10);
    }

    #[test]
    fn avoids_dangerous_cells_en_route() {
        let mut grid = Grid::new();
        if let Some(t) = grid.tile_mut(loc(5, 3)) {
            t.set_smell(true);
        }
        let mut nav = Navigator::default();
        let path = nav.find_path(&grid, loc(3, 3), loc(7, 3)).unwrap_or_default();
        assert!(!path.contains(&loc(5, 3)));
        assert_eq!(path.len(), 6);
    }

    #[test]
    fn navigator_is_reusable() {
        let mut grid = Grid::new();
        let mut nav = Navigator::default();
        let first = nav.find_path(&grid, loc(1, 1), loc(4, 1));
        assert_eq!(first.map(|p| p.len()), Some(3));

        if let Some(t) = grid.tile_mut(loc(2, 1)) {
            t.set_obstruction(true);
        }
        let second = nav.find_path(&grid, loc(1, 1), loc(4, 1)).unwrap_or_default();
        assert!(!second.contains(&loc(2, 1)));
        assert_eq!(second.len(), 5);

        let third = nav.find_path(&grid, loc(4, 1), loc(1, 1)).unwrap_or_default();
        assert_eq!(third.len(), 5);
    }

    #[test]
    fn adapts_to_grid_bounds() {
        let grid = Grid::with_bounds(Bounds::new(6, 6), InferenceConfig::default());
        let mut nav = Navigator::default();
        let path = nav.find_path(&grid, loc(1, 1), loc(5, 5)).unwrap_or_default();
        assert_eq!(path.len(), 8);
    }
}
