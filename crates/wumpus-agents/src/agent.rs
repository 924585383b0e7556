//! The agent control loop.
//!
//! An [`Agent`] owns its belief map, task queue, mover, and kit. The host
//! (a lockstep tick loop or a per-agent async task) calls [`Agent::step`]
//! once per cycle and [`Agent::absorb`] whenever a peer publishes a map.
//!
//! One cycle:
//!
//! 1. On the very first cycle, sweep the sensors at the start cell.
//! 2. Drop finished tasks.
//! 3. Discover work: the nearest unsearched cell for every kind, claimed
//!    gold for diggers, claimed monsters for hunters with ammo, and a
//!    delivery for anyone carrying gold.
//! 4. Select the best task. With nothing left to do the agent is done.
//! 5. Run one step of that task's plan and record the outcome.

use std::sync::Arc;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wumpus_types::{AgentId, AgentKind, Bounds, Location, Role, TaskId, TaskStatus};
use wumpus_world::{Grid, InferenceConfig};

use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::movement::Mover;
use crate::plan::{Kit, Plan, PlanContext, PlanEvent};
use crate::port::WorldPort;
use crate::scheduler::TaskQueue;
use crate::sensors;
use crate::task::Task;

/// Lifecycle of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Still has work.
    Active,
    /// Ran out of work. Terminal.
    Done,
    /// Walked into a pit. Terminal.
    Dead,
}

impl AgentStatus {
    /// Whether the agent will never act again.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// Running counters for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentStats {
    /// Cycles in which a task step ran.
    pub cycles: u64,
    /// Tasks that ended achieved.
    pub tasks_achieved: u32,
    /// Tasks that ended failed.
    pub tasks_failed: u32,
    /// Pieces of gold picked up.
    pub gold_grabbed: u32,
    /// Pieces of gold delivered.
    pub gold_deposited: u32,
    /// Monsters killed.
    pub monsters_killed: u32,
    /// Shots that hit nothing.
    pub shots_missed: u32,
}

/// End-of-run view of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    /// Agent identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Capability set.
    pub kind: AgentKind,
    /// Final lifecycle status.
    pub status: AgentStatus,
    /// Final position.
    pub location: Location,
    /// Rounds left.
    pub ammo: u32,
    /// Whether gold was still being carried.
    pub carrying_gold: bool,
    /// Tiles this agent's map holds as searched or visited.
    pub explored: usize,
    /// Counters.
    pub stats: AgentStats,
}

/// What one call to [`Agent::step`] did.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Status after the step.
    pub status: AgentStatus,
    /// Whether the agent's map changed.
    pub changed: bool,
    /// A copy of the map to publish to peers, present when it changed.
    pub snapshot: Option<Arc<Grid>>,
    /// The role and target worked on, if a task ran.
    pub task: Option<(Role, Location)>,
    /// Notable events raised during the step.
    pub events: Vec<PlanEvent>,
}

impl StepReport {
    const fn idle(status: AgentStatus) -> Self {
        Self {
            status,
            changed: false,
            snapshot: None,
            task: None,
            events: Vec::new(),
        }
    }
}

/// One exploring robot.
#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    name: String,
    kind: AgentKind,
    grid: Grid,
    mover: Mover,
    tasks: TaskQueue,
    kit: Kit,
    rng: StdRng,
    return_locations: Vec<Location>,
    status: AgentStatus,
    stats: AgentStats,
    initialized: bool,
}

impl Agent {
    /// Create an agent from its configuration, with a blank map of the
    /// given extent.
    pub fn new(config: &AgentConfig, bounds: Bounds, inference: InferenceConfig) -> Self {
        let ammo = if config.kind.can_play(Role::Hunt) {
            config.ammo
        } else {
            0
        };
        Self {
            id: AgentId::new(),
            name: config.name.clone(),
            kind: config.kind,
            grid: Grid::with_bounds(bounds, inference),
            mover: Mover::new(config.start, config.collision_retry_limit, config.seed),
            tasks: TaskQueue::new(),
            kit: Kit {
                ammo,
                carrying_gold: false,
            },
            rng: StdRng::seed_from_u64(config.seed.wrapping_add(1)),
            return_locations: config.return_locations.clone(),
            status: AgentStatus::Active,
            stats: AgentStats::default(),
            initialized: false,
        }
    }

    /// Unique identifier.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capability set.
    pub const fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Lifecycle status.
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    /// Current position.
    pub const fn location(&self) -> Location {
        self.mover.current()
    }

    /// The agent's belief map.
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The agent's task queue.
    pub const fn tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    /// The agent's consumables.
    pub const fn kit(&self) -> Kit {
        self.kit
    }

    /// The agent's counters.
    pub const fn stats(&self) -> AgentStats {
        self.stats
    }

    /// Fold a peer's published map into this agent's map.
    ///
    /// Dead agents ignore peers. Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::World`] if the maps have different extents.
    pub fn absorb(&mut self, peer: &Grid) -> Result<bool, AgentError> {
        if self.status == AgentStatus::Dead {
            return Ok(false);
        }
        Ok(self.grid.merge_from(peer)?)
    }

    /// Run one cycle against the world.
    ///
    /// A done agent returns an idle report without touching the world.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Dead`] if called after the agent died, and
    /// propagates map and world failures.
    pub fn step<P: WorldPort + ?Sized>(&mut self, port: &mut P) -> Result<StepReport, AgentError> {
        match self.status {
            AgentStatus::Dead => return Err(AgentError::Dead(self.id)),
            AgentStatus::Done => return Ok(StepReport::idle(AgentStatus::Done)),
            AgentStatus::Active => {}
        }

        let mut changed = false;
        if !self.initialized {
            let sweep =
                sensors::read_sensors(self.id, &mut self.grid, port, None, self.mover.current())?;
            changed |= sweep.changed;
            self.initialized = true;
        }

        self.tasks.cleanup();
        changed |= self.discover_tasks();

        let Some(task_id) = self.tasks.select(self.mover.current()) else {
            self.status = AgentStatus::Done;
            info!(agent = %self.id, name = %self.name, at = %self.mover.current(), "no work left");
            return Ok(self.report(changed, None, Vec::new()));
        };
        let (role, target, plan) = self.take_selected(task_id)?;
        let mut plan = plan.unwrap_or_else(|| Plan::for_role(role));

        let mut ctx = PlanContext::new(
            self.id,
            &mut self.grid,
            &mut self.mover,
            port,
            &mut self.kit,
        );
        let status = plan.execute(target, &mut ctx)?;
        changed |= ctx.changed;
        let events = ctx.events;

        if let Some(task) = self.tasks.get_mut(task_id) {
            task.set_plan(plan);
            task.set_status(status);
        }
        self.stats.cycles = self.stats.cycles.saturating_add(1);
        match status {
            TaskStatus::Achieved => {
                self.stats.tasks_achieved = self.stats.tasks_achieved.saturating_add(1);
                debug!(agent = %self.id, role = %role, target = %target, "task achieved");
            }
            TaskStatus::Failed => {
                self.stats.tasks_failed = self.stats.tasks_failed.saturating_add(1);
                debug!(agent = %self.id, role = %role, target = %target, "task failed");
            }
            TaskStatus::InProgress => {}
        }

        for event in &events {
            self.record(*event);
        }
        Ok(self.report(changed, Some((role, target)), events))
    }

    /// A summary of the agent for the end-of-run report.
    pub fn summary(&self) -> AgentSummary {
        AgentSummary {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind,
            status: self.status,
            location: self.mover.current(),
            ammo: self.kit.ammo,
            carrying_gold: self.kit.carrying_gold,
            explored: self.grid.explored_count(),
            stats: self.stats,
        }
    }

    /// Role, target, and stored plan of the task the queue just selected.
    fn take_selected(
        &mut self,
        task_id: TaskId,
    ) -> Result<(Role, Location, Option<Plan>), AgentError> {
        self.tasks
            .get_mut(task_id)
            .map(|t| (t.role(), t.target(), t.take_plan()))
            .ok_or(AgentError::MissingTask(self.id, task_id))
    }

    /// Offer newly visible work to the queue. Returns whether claiming
    /// changed the map.
    fn discover_tasks(&mut self) -> bool {
        let here = self.mover.current();
        let candidate = self.grid.find_nearest_unsearched_location(here);
        self.tasks.discover_search_task(here, candidate);

        let mut changed = false;
        if self.kind.can_play(Role::Fetch) {
            for gold in self.grid.find_gold(here) {
                changed |= self.grid.claim(gold);
                self.tasks.enqueue(Task::new(Role::Fetch, gold));
            }
        }
        if self.kind.can_play(Role::Hunt) && self.kit.ammo > 0 {
            for monster in self.grid.find_monsters(here) {
                changed |= self.grid.claim(monster);
                self.tasks.enqueue(Task::new(Role::Hunt, monster));
            }
        }
        if self.kit.carrying_gold && !self.tasks.has_role(Role::Return) {
            self.enqueue_return();
        }
        changed
    }

    fn enqueue_return(&mut self) {
        if self.return_locations.is_empty() {
            warn!(agent = %self.id, "carrying gold with nowhere to return it");
            return;
        }
        let i = self.rng.random_range(0..self.return_locations.len());
        if let Some(&site) = self.return_locations.get(i) {
            self.tasks.enqueue(Task::new(Role::Return, site));
        }
    }

    fn record(&mut self, event: PlanEvent) {
        match event {
            PlanEvent::GoldGrabbed(_) => {
                self.stats.gold_grabbed = self.stats.gold_grabbed.saturating_add(1);
                if !self.tasks.has_role(Role::Return) {
                    self.enqueue_return();
                }
            }
            PlanEvent::GoldDeposited(_) => {
                self.stats.gold_deposited = self.stats.gold_deposited.saturating_add(1);
            }
            PlanEvent::MonsterKilled(_) => {
                self.stats.monsters_killed = self.stats.monsters_killed.saturating_add(1);
            }
            PlanEvent::ShotMissed(_) => {
                self.stats.shots_missed = self.stats.shots_missed.saturating_add(1);
            }
            PlanEvent::Unreachable(_) => {}
            PlanEvent::Died => {
                self.status = AgentStatus::Dead;
                warn!(agent = %self.id, name = %self.name, at = %self.mover.current(), "agent died");
            }
        }
    }

    fn report(
        &self,
        changed: bool,
        task: Option<(Role, Location)>,
        events: Vec<PlanEvent>,
    ) -> StepReport {
        StepReport {
            status: self.status,
            changed,
            snapshot: changed.then(|| Arc::new(self.grid.clone())),
            task,
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use wumpus_world::{SMELL_METRIC, SMELL_SPREAD};

    use super::*;
    use crate::movement::tests::ScriptedWorld;

    fn loc(x: i32, y: i32) -> Location {
        Location::new(x, y)
    }

    fn small() -> Bounds {
        Bounds::new(8, 8)
    }

    fn agent(kind: AgentKind, start: Location, bounds: Bounds) -> Agent {
        let cfg = AgentConfig::new("test", kind, start).with_seed(3);
        Agent::new(&cfg, bounds, InferenceConfig::default())
    }

    fn run_until_done(agent: &mut Agent, world: &mut ScriptedWorld, limit: usize) -> AgentStatus {
        for _ in 0..limit {
            let status = agent.step(world).map_or(AgentStatus::Dead, |r| r.status);
            if status.is_terminal() {
                return status;
            }
        }
        AgentStatus::Active
    }

    #[test]
    fn explorer_searches_whole_map_then_stops() {
        let mut a = agent(AgentKind::Explorer, loc(2, 2), small());
        let mut world = ScriptedWorld::at(loc(2, 2));
        assert_eq!(run_until_done(&mut a, &mut world, 400), AgentStatus::Done);
        assert!(a.grid().find_nearest_unsearched_location(a.location()).is_none());
        assert_eq!(a.grid().explored_count(), a.grid().tile_count());
        assert!(a.stats().tasks_achieved > 0);
    }

    #[test]
    fn done_agent_stays_idle() {
        let mut a = agent(AgentKind::Explorer, loc(2, 2), small());
        let mut world = ScriptedWorld::at(loc(2, 2));
        run_until_done(&mut a, &mut world, 400);
        let steps = world.steps;
        let report = a.step(&mut world).ok();
        assert_eq!(report.as_ref().map(|r| r.status), Some(AgentStatus::Done));
        assert!(report.is_some_and(|r| r.snapshot.is_none() && r.task.is_none()));
        assert_eq!(world.steps, steps);
    }

    #[test]
    fn first_step_publishes_a_snapshot() {
        let mut a = agent(AgentKind::Explorer, loc(4, 4), small());
        let mut world = ScriptedWorld::at(loc(4, 4));
        let report = a.step(&mut world).ok();
        assert!(report.as_ref().is_some_and(|r| r.changed));
        assert!(
            report
                .and_then(|r| r.snapshot)
                .is_some_and(|g| g.tile(loc(4, 4)).is_some_and(wumpus_world::Tile::has_visited))
        );
    }

    #[test]
    fn digger_fetches_and_delivers_gold() {
        let mut a = agent(AgentKind::GoldDigger, loc(2, 2), small());
        let mut world = ScriptedWorld::at(loc(2, 2));
        world.gold.insert(loc(6, 6));
        assert_eq!(run_until_done(&mut a, &mut world, 600), AgentStatus::Done);
        assert_eq!(world.deposited, 1);
        assert!(world.gold.is_empty());
        assert_eq!(a.stats().gold_grabbed, 1);
        assert_eq!(a.stats().gold_deposited, 1);
        assert!(!a.kit().carrying_gold);
    }

    #[test]
    fn explorer_ignores_gold() {
        let mut a = agent(AgentKind::Explorer, loc(2, 2), small());
        let mut world = ScriptedWorld::at(loc(2, 2));
        world.gold.insert(loc(6, 6));
        assert_eq!(run_until_done(&mut a, &mut world, 400), AgentStatus::Done);
        assert_eq!(world.gold.len(), 1);
        assert_eq!(a.kit().ammo, 0);
    }

    #[test]
    fn hunter_shoots_suspected_monster() {
        let mut a = agent(AgentKind::HunterKiller, loc(10, 3), Bounds::STANDARD);
        let mut world = ScriptedWorld::at(loc(10, 3));
        let monster = loc(10, 10);
        world.monsters.insert(monster);
        if let Some(t) = a.grid.tile_mut(monster) {
            t.set_obstruction(true);
        }
        for cell in a.grid.neighbors(monster, SMELL_SPREAD, SMELL_METRIC) {
            if let Some(t) = a.grid.tile_mut(cell) {
                t.set_smell(true);
            }
        }

        for _ in 0..40 {
            if a.stats().monsters_killed > 0 {
                break;
            }
            assert!(a.step(&mut world).is_ok());
        }
        assert_eq!(a.stats().monsters_killed, 1);
        assert_eq!(a.kit().ammo, 2);
        assert!(world.monsters.is_empty());
        assert!(!a.grid().is_monster(monster));
    }

    #[test]
    fn absorb_is_idempotent() {
        let mut a = agent(AgentKind::Explorer, loc(2, 2), small());
        let mut peer = Grid::with_bounds(small(), InferenceConfig::default());
        assert!(peer.update_visited(loc(5, 5)).is_ok());
        assert!(peer.update_searched(loc(5, 5)).is_ok());
        assert!(a.absorb(&peer).is_ok_and(|c| c));
        assert!(a.absorb(&peer).is_ok_and(|c| !c));
        assert!(a.grid().tile(loc(5, 5)).is_some_and(wumpus_world::Tile::has_visited));
    }

    #[test]
    fn absorb_rejects_foreign_extent() {
        let mut a = agent(AgentKind::Explorer, loc(2, 2), small());
        let peer = Grid::new();
        assert!(matches!(a.absorb(&peer), Err(AgentError::World(_))));
    }

    #[test]
    fn selecting_an_unknown_task_is_an_error() {
        let mut a = agent(AgentKind::Explorer, loc(2, 2), small());
        let stray = TaskId::new();
        let result = a.take_selected(stray);
        assert!(matches!(
            result,
            Err(AgentError::MissingTask(agent, task)) if agent == a.id() && task == stray
        ));

        let task = Task::new(Role::AreaSearch, loc(5, 5));
        let id = task.id();
        assert!(a.tasks.enqueue(task));
        assert!(matches!(
            a.take_selected(id),
            Ok((Role::AreaSearch, target, None)) if target == loc(5, 5)
        ));
    }

    #[test]
    fn summary_reflects_state() {
        let a = agent(AgentKind::HunterKiller, loc(3, 4), small());
        let s = a.summary();
        assert_eq!(s.kind, AgentKind::HunterKiller);
        assert_eq!(s.status, AgentStatus::Active);
        assert_eq!(s.location, loc(3, 4));
        assert_eq!(s.ammo, 3);
        assert!(!s.carrying_gold);
    }
}
