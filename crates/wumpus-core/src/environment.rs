//! The ground-truth world.
//!
//! The [`Environment`] knows where every wall, pit, monster, and piece of
//! gold really is, and where every agent really stands. Agents only ever
//! see it through the [`WorldPort`] implementation at the bottom of this
//! file: four sensors and four actions, each answered from ground truth.
//!
//! Worlds are generated from a seed. The start cells and return sites are
//! kept free of hazards, and so are the cells around them, so no agent
//! dies before it has had a chance to sense.

use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wumpus_agents::{FireOutcome, MoveOutcome, PortError, WorldPort};
use wumpus_types::{AgentId, Bounds, Direction, Location, Metric, Offset};
use wumpus_world::{
    BREEZE_METRIC, BREEZE_RANGE, GLITTER_METRIC, GLITTER_RANGE, SMELL_METRIC, SMELL_RANGE,
    SONAR_METRIC, SONAR_RANGE,
};

use crate::config::WorldConfig;

/// Errors raised while building or populating an environment.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    /// More features were requested than there are free cells.
    #[error("cannot place {requested} features in {available} free cells")]
    TooCrowded {
        /// Features requested.
        requested: usize,
        /// Free cells available.
        available: usize,
    },

    /// A location lies outside the world.
    #[error("location {0} is outside the world")]
    OutOfBounds(Location),

    /// A cell is already taken by a feature or an agent.
    #[error("location {0} is already occupied")]
    Occupied(Location),

    /// The agent is already registered.
    #[error("agent {0} is already registered")]
    DuplicateAgent(AgentId),
}

/// What occupies a cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    /// Nothing.
    #[default]
    Empty,
    /// Solid rock.
    Wall,
    /// A fatal drop.
    Pit,
    /// A live monster.
    Monster,
    /// A piece of gold.
    Gold,
}

impl Cell {
    /// Whether the cell stops movement and shows up on sonar.
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Wall | Self::Monster)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Body {
    at: Location,
    alive: bool,
    /// Finished agents leave the field and stop blocking others.
    retired: bool,
    carrying: bool,
    ammo: u32,
}

/// Ground truth plus the running tallies the report needs.
#[derive(Debug, Clone)]
pub struct Environment {
    bounds: Bounds,
    cells: Vec<Cell>,
    return_locations: Vec<Location>,
    fire_range: u32,
    bodies: BTreeMap<AgentId, Body>,
    gold_deposited: u32,
    monsters_killed: u32,
    deaths: u32,
}

impl Environment {
    /// An empty world of the given extent.
    pub fn empty(bounds: Bounds, return_locations: Vec<Location>, fire_range: u32) -> Self {
        Self {
            bounds,
            cells: vec![Cell::Empty; bounds.cell_count()],
            return_locations,
            fire_range,
            bodies: BTreeMap::new(),
            gold_deposited: 0,
            monsters_killed: 0,
            deaths: 0,
        }
    }

    /// Generate a world from `config`, keeping `starts` and the return
    /// sites (and the cells around them) free of walls, pits, and monsters.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::TooCrowded`] if the requested features do
    /// not fit in the free cells.
    pub fn generate(config: &WorldConfig, starts: &[Location]) -> Result<Self, EnvironmentError> {
        let bounds = config.bounds();
        let mut env = Self::empty(bounds, config.return_locations.clone(), config.fire_range);

        let protected: BTreeSet<Location> = starts
            .iter()
            .chain(config.return_locations.iter())
            .flat_map(|&origin| {
                bounds.locations().filter(move |l| {
                    Metric::Square.within(
                        l.x.saturating_sub(origin.x),
                        l.y.saturating_sub(origin.y),
                        1,
                    )
                })
            })
            .collect();
        let mut free: Vec<Location> = bounds
            .locations()
            .filter(|l| !protected.contains(l))
            .collect();

        let counts = [
            (Cell::Wall, config.walls),
            (Cell::Pit, config.pits),
            (Cell::Monster, config.monsters),
            (Cell::Gold, config.gold),
        ];
        let requested = counts
            .iter()
            .map(|(_, n)| usize::try_from(*n).unwrap_or(usize::MAX))
            .fold(0_usize, usize::saturating_add);
        if requested > free.len() {
            return Err(EnvironmentError::TooCrowded {
                requested,
                available: free.len(),
            });
        }

        let mut rng = StdRng::seed_from_u64(config.seed);
        free.shuffle(&mut rng);
        let mut slots = free.into_iter();
        for (cell, n) in counts {
            for loc in slots.by_ref().take(usize::try_from(n).unwrap_or(0)) {
                env.set(loc, cell)?;
            }
        }
        info!(
            seed = config.seed,
            walls = config.walls,
            pits = config.pits,
            monsters = config.monsters,
            gold = config.gold,
            "world generated"
        );
        Ok(env)
    }

    /// The world's extent.
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// What occupies `loc`. `None` off the map.
    pub fn cell(&self, loc: Location) -> Option<Cell> {
        self.bounds
            .index_of(loc)
            .and_then(|i| self.cells.get(i))
            .copied()
    }

    /// Place `cell` at `loc`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::OutOfBounds`] if `loc` is off the map.
    pub fn set(&mut self, loc: Location, cell: Cell) -> Result<(), EnvironmentError> {
        let slot = self
            .bounds
            .index_of(loc)
            .and_then(|i| self.cells.get_mut(i))
            .ok_or(EnvironmentError::OutOfBounds(loc))?;
        *slot = cell;
        Ok(())
    }

    /// Put an agent into the world.
    ///
    /// # Errors
    ///
    /// Returns [`EnvironmentError::OutOfBounds`] if `at` is off the map,
    /// [`EnvironmentError::Occupied`] if `at` is solid or holds another
    /// agent, or [`EnvironmentError::DuplicateAgent`] if `agent` is known.
    pub fn register(
        &mut self,
        agent: AgentId,
        at: Location,
        ammo: u32,
    ) -> Result<(), EnvironmentError> {
        let cell = self.cell(at).ok_or(EnvironmentError::OutOfBounds(at))?;
        if self.bodies.contains_key(&agent) {
            return Err(EnvironmentError::DuplicateAgent(agent));
        }
        if cell.is_solid() || self.occupant(at).is_some() {
            return Err(EnvironmentError::Occupied(at));
        }
        self.bodies.insert(
            agent,
            Body {
                at,
                alive: true,
                retired: false,
                carrying: false,
                ammo,
            },
        );
        Ok(())
    }

    /// Where an agent stands, if registered.
    pub fn position(&self, agent: AgentId) -> Option<Location> {
        self.bodies.get(&agent).map(|b| b.at)
    }

    /// Take a finished agent off the field so it no longer blocks movement.
    pub fn retire(&mut self, agent: AgentId) {
        if let Some(body) = self.bodies.get_mut(&agent) {
            body.retired = true;
            debug!(agent = %agent, at = %body.at, "agent retired");
        }
    }

    /// Whether an agent is registered and alive.
    pub fn is_alive(&self, agent: AgentId) -> bool {
        self.bodies.get(&agent).is_some_and(|b| b.alive)
    }

    /// Gold delivered to a return site so far.
    pub const fn gold_deposited(&self) -> u32 {
        self.gold_deposited
    }

    /// Monsters shot so far.
    pub const fn monsters_killed(&self) -> u32 {
        self.monsters_killed
    }

    /// Agents lost to pits so far.
    pub const fn deaths(&self) -> u32 {
        self.deaths
    }

    /// Gold still lying in the world.
    pub fn gold_remaining(&self) -> usize {
        self.count(Cell::Gold)
    }

    /// Monsters still alive.
    pub fn monsters_remaining(&self) -> usize {
        self.count(Cell::Monster)
    }

    fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|c| **c == cell).count()
    }

    /// The live agent standing on `loc`, if any.
    fn occupant(&self, loc: Location) -> Option<AgentId> {
        self.bodies
            .iter()
            .find(|(_, b)| b.alive && !b.retired && b.at == loc)
            .map(|(id, _)| *id)
    }

    fn body(&self, agent: AgentId) -> Result<Body, PortError> {
        let body = self
            .bodies
            .get(&agent)
            .copied()
            .ok_or(PortError::UnknownAgent(agent))?;
        if !body.alive {
            return Err(PortError::AgentDead(agent));
        }
        Ok(body)
    }

    fn body_mut(&mut self, agent: AgentId) -> Result<&mut Body, PortError> {
        let body = self
            .bodies
            .get_mut(&agent)
            .ok_or(PortError::UnknownAgent(agent))?;
        if !body.alive {
            return Err(PortError::AgentDead(agent));
        }
        Ok(body)
    }

    /// Whether any cell within `range` of `at` satisfies `pred`.
    fn any_near<F>(&self, at: Location, range: u32, metric: Metric, pred: F) -> bool
    where
        F: Fn(Cell) -> bool,
    {
        self.bounds.locations().any(|l| {
            metric.within(l.x.saturating_sub(at.x), l.y.saturating_sub(at.y), range)
                && self.cell(l).is_some_and(&pred)
        })
    }
}

impl WorldPort for Environment {
    fn sonar(&mut self, agent: AgentId) -> Result<Vec<Offset>, PortError> {
        let at = self.body(agent)?.at;
        Ok(self
            .bounds
            .locations()
            .filter(|&l| l != at)
            .map(|l| Offset::new(l.x.saturating_sub(at.x), l.y.saturating_sub(at.y)))
            .filter(|o| SONAR_METRIC.within(o.dx, o.dy, SONAR_RANGE))
            .filter(|o| self.cell(o.from(at)).is_some_and(Cell::is_solid))
            .collect())
    }

    fn breeze(&mut self, agent: AgentId) -> Result<bool, PortError> {
        let at = self.body(agent)?.at;
        Ok(self.any_near(at, BREEZE_RANGE, BREEZE_METRIC, |c| c == Cell::Pit))
    }

    fn smell(&mut self, agent: AgentId) -> Result<bool, PortError> {
        let at = self.body(agent)?.at;
        Ok(self.any_near(at, SMELL_RANGE, SMELL_METRIC, |c| c == Cell::Monster))
    }

    fn glitter(&mut self, agent: AgentId) -> Result<bool, PortError> {
        let at = self.body(agent)?.at;
        Ok(self.any_near(at, GLITTER_RANGE, GLITTER_METRIC, |c| c == Cell::Gold))
    }

    fn step(&mut self, agent: AgentId, dir: Direction) -> Result<MoveOutcome, PortError> {
        let at = self.body(agent)?.at;
        let next = at.step(dir);
        let Some(cell) = self.cell(next) else {
            return Ok(MoveOutcome::Blocked);
        };
        if cell.is_solid() || self.occupant(next).is_some() {
            return Ok(MoveOutcome::Blocked);
        }
        let body = self.body_mut(agent)?;
        body.at = next;
        if cell == Cell::Pit {
            body.alive = false;
            self.deaths = self.deaths.saturating_add(1);
            info!(agent = %agent, at = %next, "agent fell into a pit");
            return Ok(MoveOutcome::Died);
        }
        Ok(MoveOutcome::Moved(next))
    }

    fn grab(&mut self, agent: AgentId) -> Result<bool, PortError> {
        let body = self.body(agent)?;
        if body.carrying || self.cell(body.at) != Some(Cell::Gold) {
            return Ok(false);
        }
        self.set(body.at, Cell::Empty).map_err(|e| PortError::Internal {
            message: e.to_string(),
        })?;
        self.body_mut(agent)?.carrying = true;
        debug!(agent = %agent, at = %body.at, "gold picked up");
        Ok(true)
    }

    fn deposit(&mut self, agent: AgentId) -> Result<bool, PortError> {
        let body = self.body(agent)?;
        if !body.carrying || !self.return_locations.contains(&body.at) {
            return Ok(false);
        }
        self.body_mut(agent)?.carrying = false;
        self.gold_deposited = self.gold_deposited.saturating_add(1);
        info!(agent = %agent, at = %body.at, total = self.gold_deposited, "gold delivered");
        Ok(true)
    }

    fn fire(&mut self, agent: AgentId, dir: Direction) -> Result<FireOutcome, PortError> {
        let body = self.body_mut(agent)?;
        if body.ammo == 0 {
            return Ok(FireOutcome::Empty);
        }
        body.ammo = body.ammo.saturating_sub(1);
        let origin = body.at;

        let mut cell = origin;
        for _ in 0..self.fire_range {
            cell = cell.step(dir);
            match self.cell(cell) {
                Some(Cell::Monster) => {
                    self.set(cell, Cell::Empty).map_err(|e| PortError::Internal {
                        message: e.to_string(),
                    })?;
                    self.monsters_killed = self.monsters_killed.saturating_add(1);
                    info!(agent = %agent, at = %cell, "monster killed");
                    return Ok(FireOutcome::Killed(cell));
                }
                Some(Cell::Wall) | None => break,
                Some(Cell::Empty | Cell::Pit | Cell::Gold) => {}
            }
        }
        debug!(agent = %agent, from = %origin, direction = ?dir, "shot missed");
        Ok(FireOutcome::Missed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(x: i32, y: i32) -> Location {
        Location::new(x, y)
    }

    fn world() -> Environment {
        Environment::empty(Bounds::new(12, 12), vec![loc(2, 3), loc(3, 2)], 4)
    }

    fn with_agent(env: &mut Environment, at: Location) -> AgentId {
        let id = AgentId::new();
        assert!(env.register(id, at, 2).is_ok());
        id
    }

    #[test]
    fn generation_is_seeded_and_respects_counts() {
        let config = WorldConfig::default();
        let starts = [loc(1, 1), loc(2, 2)];
        let a = Environment::generate(&config, &starts).ok();
        let b = Environment::generate(&config, &starts).ok();
        assert!(a.is_some());
        assert_eq!(a.as_ref().map(|e| e.cells.clone()), b.map(|e| e.cells));

        let env = a.unwrap_or_else(world);
        assert_eq!(env.count(Cell::Wall), 40);
        assert_eq!(env.count(Cell::Pit), 20);
        assert_eq!(env.monsters_remaining(), 8);
        assert_eq!(env.gold_remaining(), 10);
    }

    #[test]
    fn generation_keeps_starts_and_surroundings_clear() {
        let config = WorldConfig::default();
        let starts = [loc(10, 10)];
        let env = Environment::generate(&config, &starts).ok();
        for dx in -1..=1 {
            for dy in -1..=1 {
                let at = loc(10_i32.saturating_add(dx), 10_i32.saturating_add(dy));
                let cell = env.as_ref().and_then(|e| e.cell(at));
                assert_eq!(cell, Some(Cell::Empty));
            }
        }
    }

    #[test]
    fn overcrowded_world_is_rejected() {
        let config = WorldConfig {
            max_x: 6,
            max_y: 6,
            walls: 30,
            ..WorldConfig::default()
        };
        assert!(matches!(
            Environment::generate(&config, &[loc(4, 4)]),
            Err(EnvironmentError::TooCrowded { .. })
        ));
    }

    #[test]
    fn registration_rejects_bad_cells() {
        let mut env = world();
        assert!(env.set(loc(5, 5), Cell::Wall).is_ok());
        let a = with_agent(&mut env, loc(4, 4));
        let off_map = env.register(AgentId::new(), loc(0, 4), 0);
        assert!(matches!(off_map, Err(EnvironmentError::OutOfBounds(_))));
        let in_wall = env.register(AgentId::new(), loc(5, 5), 0);
        assert!(matches!(in_wall, Err(EnvironmentError::Occupied(_))));
        let on_agent = env.register(AgentId::new(), loc(4, 4), 0);
        assert!(matches!(on_agent, Err(EnvironmentError::Occupied(_))));
        let twice = env.register(a, loc(6, 6), 0);
        assert!(matches!(twice, Err(EnvironmentError::DuplicateAgent(_))));
    }

    #[test]
    fn sensors_report_ground_truth() {
        let mut env = world();
        assert!(env.set(loc(6, 5), Cell::Pit).is_ok());
        assert!(env.set(loc(5, 7), Cell::Monster).is_ok());
        assert!(env.set(loc(4, 5), Cell::Gold).is_ok());
        assert!(env.set(loc(5, 9), Cell::Wall).is_ok());
        let a = with_agent(&mut env, loc(5, 5));

        assert_eq!(env.breeze(a).ok(), Some(true));
        assert_eq!(env.smell(a).ok(), Some(true));
        assert_eq!(env.glitter(a).ok(), Some(true));
        let mut sonar = env.sonar(a).unwrap_or_default();
        sonar.sort_by_key(|o| (o.dx, o.dy));
        assert_eq!(sonar, vec![Offset::new(0, 2), Offset::new(0, 4)]);
    }

    #[test]
    fn sensors_are_quiet_in_empty_space() {
        let mut env = world();
        let a = with_agent(&mut env, loc(5, 5));
        assert_eq!(env.breeze(a).ok(), Some(false));
        assert_eq!(env.smell(a).ok(), Some(false));
        assert_eq!(env.glitter(a).ok(), Some(false));
        assert_eq!(env.sonar(a).map(|s| s.len()).ok(), Some(0));
    }

    #[test]
    fn movement_is_blocked_by_walls_agents_and_edges() {
        let mut env = world();
        assert!(env.set(loc(6, 5), Cell::Wall).is_ok());
        let a = with_agent(&mut env, loc(5, 5));
        let _b = with_agent(&mut env, loc(5, 6));
        let edge = with_agent(&mut env, loc(1, 1));

        assert_eq!(env.step(a, Direction::East).ok(), Some(MoveOutcome::Blocked));
        assert_eq!(env.step(a, Direction::North).ok(), Some(MoveOutcome::Blocked));
        assert_eq!(env.step(edge, Direction::South).ok(), Some(MoveOutcome::Blocked));
        assert_eq!(env.step(a, Direction::West).ok(), Some(MoveOutcome::Moved(loc(4, 5))));
        assert_eq!(env.position(a), Some(loc(4, 5)));
    }

    #[test]
    fn retired_agents_stop_blocking() {
        let mut env = world();
        let a = with_agent(&mut env, loc(5, 5));
        let b = with_agent(&mut env, loc(6, 5));
        assert_eq!(env.step(a, Direction::East).ok(), Some(MoveOutcome::Blocked));
        env.retire(b);
        assert_eq!(env.step(a, Direction::East).ok(), Some(MoveOutcome::Moved(loc(6, 5))));
    }

    #[test]
    fn pits_are_fatal() {
        let mut env = world();
        assert!(env.set(loc(6, 5), Cell::Pit).is_ok());
        let a = with_agent(&mut env, loc(5, 5));
        assert_eq!(env.step(a, Direction::East).ok(), Some(MoveOutcome::Died));
        assert!(!env.is_alive(a));
        assert_eq!(env.deaths(), 1);
        assert!(matches!(env.breeze(a), Err(PortError::AgentDead(_))));
    }

    #[test]
    fn unknown_agents_are_rejected() {
        let mut env = world();
        assert!(matches!(env.smell(AgentId::new()), Err(PortError::UnknownAgent(_))));
    }

    #[test]
    fn gold_is_grabbed_once_and_delivered_at_return_sites() {
        let mut env = world();
        assert!(env.set(loc(2, 4), Cell::Gold).is_ok());
        let a = with_agent(&mut env, loc(2, 4));
        assert_eq!(env.deposit(a).ok(), Some(false));
        assert_eq!(env.grab(a).ok(), Some(true));
        assert_eq!(env.grab(a).ok(), Some(false));
        assert_eq!(env.gold_remaining(), 0);
        // Not a return site.
        assert_eq!(env.deposit(a).ok(), Some(false));
        assert_eq!(env.step(a, Direction::South).ok(), Some(MoveOutcome::Moved(loc(2, 3))));
        assert_eq!(env.deposit(a).ok(), Some(true));
        assert_eq!(env.gold_deposited(), 1);
    }

    #[test]
    fn shots_kill_the_first_monster_in_range() {
        let mut env = world();
        assert!(env.set(loc(5, 8), Cell::Monster).is_ok());
        assert!(env.set(loc(5, 9), Cell::Monster).is_ok());
        let a = with_agent(&mut env, loc(5, 5));
        assert_eq!(env.fire(a, Direction::North).ok(), Some(FireOutcome::Killed(loc(5, 8))));
        assert_eq!(env.monsters_remaining(), 1);
        assert_eq!(env.monsters_killed(), 1);
        // (5,9) is in range too.
        assert_eq!(env.fire(a, Direction::North).ok(), Some(FireOutcome::Killed(loc(5, 9))));
        assert_eq!(env.fire(a, Direction::North).ok(), Some(FireOutcome::Empty));
    }

    #[test]
    fn walls_stop_shots() {
        let mut env = world();
        assert!(env.set(loc(5, 6), Cell::Wall).is_ok());
        assert!(env.set(loc(5, 7), Cell::Monster).is_ok());
        let a = with_agent(&mut env, loc(5, 5));
        assert_eq!(env.fire(a, Direction::North).ok(), Some(FireOutcome::Missed));
        assert_eq!(env.monsters_remaining(), 1);
    }
}
