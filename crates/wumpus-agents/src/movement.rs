//! Single-step movement toward a destination.
//!
//! The [`Mover`] tracks where the agent is, where it was one step ago
//! (sensor fusion needs the direction of travel), and where it is headed.
//! Each call to [`Mover::move_toward`] re-plans with the [`Navigator`]
//! against the current map and takes at most one step.
//!
//! When another agent is in the way, the mover tries random safe directions
//! to shake loose. Those retries are budgeted per destination: the counter
//! only resets when the destination changes, so two agents that keep
//! blocking each other eventually give up instead of dancing forever.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};
use wumpus_types::{AgentId, Direction, Location};
use wumpus_world::{Grid, Navigator};

use crate::error::AgentError;
use crate::port::{MoveOutcome, WorldPort};

/// Result of one movement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Already standing on the destination.
    Arrived,
    /// Took one step.
    Moved,
    /// Could not move this cycle; try again next cycle.
    Blocked,
    /// The destination cannot be reached through known-safe cells.
    NoPath,
    /// Walked into a pit.
    Died,
}

/// Position tracking and one-step movement for a single agent.
#[derive(Debug, Clone)]
pub struct Mover {
    current: Location,
    previous: Option<Location>,
    destination: Option<Location>,
    collisions: u32,
    retry_limit: u32,
    navigator: Navigator,
    rng: StdRng,
}

impl Mover {
    /// Create a mover standing at `start`.
    pub fn new(start: Location, retry_limit: u32, seed: u64) -> Self {
        Self {
            current: start,
            previous: None,
            destination: None,
            collisions: 0,
            retry_limit,
            navigator: Navigator::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Where the agent stands.
    pub const fn current(&self) -> Location {
        self.current
    }

    /// Where the agent stood before its last step.
    pub const fn previous(&self) -> Option<Location> {
        self.previous
    }

    /// Where the agent is headed.
    pub const fn destination(&self) -> Option<Location> {
        self.destination
    }

    /// Collision retries spent on the current destination.
    pub const fn collisions(&self) -> u32 {
        self.collisions
    }

    /// Whether the agent stands on its destination.
    pub fn is_at_destination(&self) -> bool {
        self.destination == Some(self.current)
    }

    /// Head for `loc`. Changing the destination resets the collision budget.
    pub fn set_destination(&mut self, loc: Location) {
        if self.destination != Some(loc) {
            self.destination = Some(loc);
            self.collisions = 0;
        }
    }

    /// Take one step along the current best path to the destination.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NoDestination`] if no destination is set, or
    /// [`AgentError::Port`] if the world fails the move.
    pub fn move_toward<P: WorldPort + ?Sized>(
        &mut self,
        agent: AgentId,
        grid: &Grid,
        port: &mut P,
    ) -> Result<Step, AgentError> {
        let destination = self.destination.ok_or(AgentError::NoDestination(agent))?;
        let Some(path) = self.navigator.find_path(grid, self.current, destination) else {
            debug!(agent = %agent, from = %self.current, to = %destination, "no path");
            return Ok(Step::NoPath);
        };
        let Some(dir) = path.first().and_then(|next| self.current.direction_to(*next)) else {
            return Ok(Step::Arrived);
        };

        match port.step(agent, dir)? {
            MoveOutcome::Moved(to) => {
                self.record_step(to);
                Ok(Step::Moved)
            }
            MoveOutcome::Died => Ok(Step::Died),
            MoveOutcome::Blocked if grid.is_surrounded(self.current) => Ok(Step::Blocked),
            MoveOutcome::Blocked => self.handle_collision(agent, grid, port),
        }
    }

    /// Try random safe directions until one works or the budget runs out.
    fn handle_collision<P: WorldPort + ?Sized>(
        &mut self,
        agent: AgentId,
        grid: &Grid,
        port: &mut P,
    ) -> Result<Step, AgentError> {
        while self.collisions < self.retry_limit {
            self.collisions = self.collisions.saturating_add(1);
            let dir = self.random_direction();
            if !grid.is_passable(self.current.step(dir)) {
                continue;
            }
            match port.step(agent, dir)? {
                MoveOutcome::Moved(to) => {
                    debug!(agent = %agent, attempts = self.collisions, "collision resolved");
                    self.record_step(to);
                    return Ok(Step::Moved);
                }
                MoveOutcome::Died => return Ok(Step::Died),
                MoveOutcome::Blocked => {}
            }
        }
        warn!(agent = %agent, at = %self.current, "collision retries exhausted");
        Ok(Step::Blocked)
    }

    fn random_direction(&mut self) -> Direction {
        let i = self.rng.random_range(0..Direction::ALL.len());
        Direction::ALL.get(i).copied().unwrap_or(Direction::North)
    }

    fn record_step(&mut self, to: Location) {
        self.previous = Some(self.current);
        self.current = to;
    }
}
