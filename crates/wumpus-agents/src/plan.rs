//! Role plans: what an agent does, one step at a time, for each role.
//!
//! A [`Plan`] is the execution state of one task. Each call to
//! [`Plan::execute`] performs at most one world action (a step, a grab, a
//! deposit, or a shot) and reports the task's status afterwards. Every
//! successful step is followed by a sensor sweep so the map stays current
//! while the agent walks.
//!
//! | Role         | Achieved when                         | Failed when                        |
//! |--------------|---------------------------------------|------------------------------------|
//! | `AreaSearch` | target searched or reached            | no safe path (target re-labelled)  |
//! | `Fetch`      | gold grabbed at target                | gold gone, grab empty, no path     |
//! | `Hunt`       | monster shot or no longer suspected   | out of ammo, miss, no position     |
//! | `Return`     | gold deposited, or nothing to deliver | deposit refused, no path           |

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wumpus_types::{AgentId, Location, Metric, Percept, Role, TaskStatus};
use wumpus_world::{Grid, SMELL_METRIC, SMELL_RANGE, SMELL_SPREAD, Tile};

use crate::error::AgentError;
use crate::movement::{Mover, Step};
use crate::port::{FireOutcome, WorldPort};
use crate::sensors;

/// Manhattan radius around a monster from which a hunter will shoot.
pub const TARGETING_RANGE: u32 = SMELL_RANGE.saturating_mul(2);

/// Consumables an agent carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Kit {
    /// Rounds left.
    pub ammo: u32,
    /// Whether a piece of gold is being carried.
    pub carrying_gold: bool,
}

/// Notable things that happened while executing a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanEvent {
    /// Gold was picked up at the location.
    GoldGrabbed(Location),
    /// Gold was delivered at the location.
    GoldDeposited(Location),
    /// A monster was killed at the location.
    MonsterKilled(Location),
    /// A shot at the location hit nothing.
    ShotMissed(Location),
    /// The location was found unreachable.
    Unreachable(Location),
    /// The agent died.
    Died,
}

/// Everything a plan may touch during one step.
pub struct PlanContext<'a, P: WorldPort + ?Sized> {
    /// The acting agent.
    pub agent: AgentId,
    /// The agent's belief map.
    pub grid: &'a mut Grid,
    /// The agent's mover.
    pub mover: &'a mut Mover,
    /// The world.
    pub port: &'a mut P,
    /// The agent's consumables.
    pub kit: &'a mut Kit,
    /// Whether the map changed during this step.
    pub changed: bool,
    /// The sensor readings taken during this step, if any.
    pub percept: Option<Percept>,
    /// Events raised during this step.
    pub events: Vec<PlanEvent>,
}

impl<'a, P: WorldPort + ?Sized> PlanContext<'a, P> {
    /// Bundle an agent's parts for one plan step.
    pub const fn new(
        agent: AgentId,
        grid: &'a mut Grid,
        mover: &'a mut Mover,
        port: &'a mut P,
        kit: &'a mut Kit,
    ) -> Self {
        Self {
            agent,
            grid,
            mover,
            port,
            kit,
            changed: false,
            percept: None,
            events: Vec::new(),
        }
    }

    /// Walk one step toward `target`, sensing after a successful step.
    fn advance(&mut self, target: Location) -> Result<Step, AgentError> {
        self.mover.set_destination(target);
        if self.mover.current() == target {
            return Ok(Step::Arrived);
        }
        let step = self.mover.move_toward(self.agent, self.grid, self.port)?;
        match step {
            Step::Moved => self.sense()?,
            Step::Died => self.events.push(PlanEvent::Died),
            Step::Arrived | Step::Blocked | Step::NoPath => {}
        }
        Ok(step)
    }

    /// Sweep the sensors at the current location.
    fn sense(&mut self) -> Result<(), AgentError> {
        let sweep = sensors::read_sensors(
            self.agent,
            self.grid,
            self.port,
            self.mover.previous(),
            self.mover.current(),
        )?;
        self.changed |= sweep.changed;
        self.percept = Some(sweep.percept);
        Ok(())
    }
}

/// Hunting state: where to shoot from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HuntPlan {
    /// Remaining firing positions, nearest first. Computed on first use.
    firing_positions: Option<VecDeque<Location>>,
    /// The firing position currently being walked to.
    position: Option<Location>,
}

/// Execution state for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plan {
    /// Walk to the target so it and its neighbors get sensed.
    AreaSearch,
    /// Walk to the gold and pick it up.
    Fetch,
    /// Get in line with the monster and shoot it.
    Hunt(HuntPlan),
    /// Carry gold to the return site and drop it.
    Return,
}

impl Plan {
    /// A fresh plan for `role`.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::AreaSearch => Self::AreaSearch,
            Role::Fetch => Self::Fetch,
            Role::Hunt => Self::Hunt(HuntPlan::default()),
            Role::Return => Self::Return,
        }
    }

    /// Perform one step of the plan against `target`.
    ///
    /// # Errors
    ///
    /// Propagates world and map failures; ordinary setbacks (blocked moves,
    /// unreachable cells) are reported through the returned status.
    pub fn execute<P: WorldPort + ?Sized>(
        &mut self,
        target: Location,
        ctx: &mut PlanContext<'_, P>,
    ) -> Result<TaskStatus, AgentError> {
        match self {
            Self::AreaSearch => search_area(target, ctx),
            Self::Fetch => fetch_gold(target, ctx),
            Self::Hunt(state) => hunt(state, target, ctx),
            Self::Return => return_gold(target, ctx),
        }
    }
}

fn search_area<P: WorldPort + ?Sized>(
    target: Location,
    ctx: &mut PlanContext<'_, P>,
) -> Result<TaskStatus, AgentError> {
    if !ctx.grid.is_searchable(target) {
        return Ok(TaskStatus::Achieved);
    }
    let status = match ctx.advance(target)? {
        Step::Arrived => TaskStatus::Achieved,
        Step::Moved if ctx.mover.current() == target || !ctx.grid.is_searchable(target) => {
            TaskStatus::Achieved
        }
        Step::Moved | Step::Blocked => TaskStatus::InProgress,
        Step::NoPath => {
            ctx.changed |= ctx.grid.mark_unreachable(ctx.mover.current(), target);
            ctx.events.push(PlanEvent::Unreachable(target));
            TaskStatus::Failed
        }
        Step::Died => TaskStatus::Failed,
    };
    Ok(status)
}

fn fetch_gold<P: WorldPort + ?Sized>(
    target: Location,
    ctx: &mut PlanContext<'_, P>,
) -> Result<TaskStatus, AgentError> {
    if ctx.mover.current() == target {
        if ctx.kit.carrying_gold {
            // Hands full; the pending delivery outranks this task.
            return Ok(TaskStatus::InProgress);
        }
        let grabbed = ctx.port.grab(ctx.agent)?;
        if let Some(tile) = ctx.grid.tile_mut(target) {
            ctx.changed |= tile.set_glitter(false);
        }
        if !grabbed {
            debug!(agent = %ctx.agent, at = %target, "no gold to grab");
            return Ok(TaskStatus::Failed);
        }
        ctx.kit.carrying_gold = true;
        ctx.events.push(PlanEvent::GoldGrabbed(target));
        info!(agent = %ctx.agent, at = %target, "gold grabbed");
        return Ok(TaskStatus::Achieved);
    }

    if !ctx.grid.tile(target).is_some_and(Tile::has_glitter) {
        return Ok(TaskStatus::Failed);
    }
    let status = match ctx.advance(target)? {
        Step::Arrived | Step::Moved | Step::Blocked => TaskStatus::InProgress,
        Step::NoPath | Step::Died => TaskStatus::Failed,
    };
    Ok(status)
}

fn hunt<P: WorldPort + ?Sized>(
    state: &mut HuntPlan,
    target: Location,
    ctx: &mut PlanContext<'_, P>,
) -> Result<TaskStatus, AgentError> {
    if ctx.kit.ammo == 0 {
        return Ok(TaskStatus::Failed);
    }
    if !ctx.grid.is_monster(target) {
        return Ok(TaskStatus::Achieved);
    }

    let here = ctx.mover.current();
    if can_fire(ctx.grid, here, target) {
        return fire(target, ctx);
    }

    if state.position == Some(here) {
        state.position = None;
    }
    if state.position.is_none() {
        let positions = state
            .firing_positions
            .get_or_insert_with(|| firing_positions(ctx.grid, target, here));
        state.position = positions.pop_front();
    }
    let Some(position) = state.position else {
        debug!(agent = %ctx.agent, target = %target, "no firing positions left");
        return Ok(TaskStatus::Failed);
    };

    let status = match ctx.advance(position)? {
        Step::NoPath => {
            state.position = None;
            TaskStatus::InProgress
        }
        Step::Died => TaskStatus::Failed,
        Step::Arrived | Step::Moved | Step::Blocked => TaskStatus::InProgress,
    };
    Ok(status)
}

fn fire<P: WorldPort + ?Sized>(
    target: Location,
    ctx: &mut PlanContext<'_, P>,
) -> Result<TaskStatus, AgentError> {
    let here = ctx.mover.current();
    let Some(dir) = here.direction_to(target) else {
        return Ok(TaskStatus::Failed);
    };
    match ctx.port.fire(ctx.agent, dir)? {
        FireOutcome::Killed(at) => {
            ctx.kit.ammo = ctx.kit.ammo.saturating_sub(1);
            for cell in ctx.grid.neighbors(at, SMELL_SPREAD, SMELL_METRIC) {
                if let Some(tile) = ctx.grid.tile_mut(cell) {
                    ctx.changed |= tile.set_smell(false);
                }
            }
            if let Some(tile) = ctx.grid.tile_mut(at) {
                ctx.changed |= tile.set_obstruction(false);
            }
            ctx.events.push(PlanEvent::MonsterKilled(at));
            info!(agent = %ctx.agent, at = %at, ammo = ctx.kit.ammo, "monster killed");
            Ok(TaskStatus::Achieved)
        }
        FireOutcome::Missed => {
            ctx.kit.ammo = ctx.kit.ammo.saturating_sub(1);
            ctx.events.push(PlanEvent::ShotMissed(target));
            debug!(agent = %ctx.agent, target = %target, "shot missed");
            Ok(TaskStatus::Failed)
        }
        FireOutcome::Empty => {
            ctx.kit.ammo = 0;
            Ok(TaskStatus::Failed)
        }
    }
}

fn return_gold<P: WorldPort + ?Sized>(
    target: Location,
    ctx: &mut PlanContext<'_, P>,
) -> Result<TaskStatus, AgentError> {
    if !ctx.kit.carrying_gold {
        return Ok(TaskStatus::Achieved);
    }
    if ctx.mover.current() == target {
        if !ctx.port.deposit(ctx.agent)? {
            return Ok(TaskStatus::Failed);
        }
        ctx.kit.carrying_gold = false;
        ctx.events.push(PlanEvent::GoldDeposited(target));
        info!(agent = %ctx.agent, at = %target, "gold deposited");
        return Ok(TaskStatus::Achieved);
    }
    let status = match ctx.advance(target)? {
        Step::Arrived | Step::Moved | Step::Blocked => TaskStatus::InProgress,
        Step::NoPath | Step::Died => TaskStatus::Failed,
    };
    Ok(status)
}

/// Whether a shot from `from` would reach a suspected monster at `target`.
pub fn can_fire(grid: &Grid, from: Location, target: Location) -> bool {
    from != target
        && from.in_line(target)
        && from.manhattan(target) <= TARGETING_RANGE
        && !grid.is_obstruction_between(from, target)
        && grid.is_monster(target)
}

/// Safe cells in line with `target` and within range of it with a clear
/// line of fire, nearest to `from` first.
pub fn firing_positions(grid: &Grid, target: Location, from: Location) -> VecDeque<Location> {
    let mut positions: Vec<Location> = grid
        .neighbors(target, TARGETING_RANGE, Metric::Manhattan)
        .into_iter()
        .filter(|&c| {
            grid.is_passable(c) && c.in_line(target) && !grid.is_obstruction_between(c, target)
        })
        .collect();
    positions.sort_by_key(|c| c.proximity_key(from));
    positions.into()
}

#[cfg(test)]
mod tests {
    use wumpus_types::Offset;

    use super::*;
    use crate::movement::tests::ScriptedWorld;

    fn loc(x: i32, y: i32) -> Location {
        Location::new(x, y)
    }

    struct Rig {
        agent: AgentId,
        grid: Grid,
        mover: Mover,
        kit: Kit,
        world: ScriptedWorld,
    }

    impl Rig {
        fn at(start: Location) -> Self {
            Self {
                agent: AgentId::new(),
                grid: Grid::new(),
                mover: Mover::new(start, 25, 1),
                kit: Kit::default(),
                world: ScriptedWorld::at(start),
            }
        }

        fn run(&mut self, plan: &mut Plan, target: Location) -> (TaskStatus, Vec<PlanEvent>) {
            let mut ctx = PlanContext::new(
                self.agent,
                &mut self.grid,
                &mut self.mover,
                &mut self.world,
                &mut self.kit,
            );
            let status = plan.execute(target, &mut ctx).unwrap_or(TaskStatus::Failed);
            (status, ctx.events)
        }

        fn run_until_done(&mut self, plan: &mut Plan, target: Location, limit: usize) -> TaskStatus {
            for _ in 0..limit {
                let (status, _) = self.run(plan, target);
                if !status.is_in_progress() {
                    return status;
                }
            }
            TaskStatus::InProgress
        }

        /// Plant a monster the map can infer: an obstruction ringed by smell.
        fn suspect(&mut self, at: Location) {
            if let Some(t) = self.grid.tile_mut(at) {
                t.set_obstruction(true);
            }
            for cell in self.grid.neighbors(at, SMELL_SPREAD, SMELL_METRIC) {
                if let Some(t) = self.grid.tile_mut(cell) {
                    t.set_smell(true);
                }
            }
        }
    }

    #[test]
    fn area_search_walks_to_target() {
        let mut rig = Rig::at(loc(3, 3));
        let mut plan = Plan::for_role(Role::AreaSearch);
        let status = rig.run_until_done(&mut plan, loc(8, 3), 20);
        assert_eq!(status, TaskStatus::Achieved);
        assert!(rig.grid.tile(loc(8, 3)).is_some_and(Tile::has_searched));
    }

    #[test]
    fn area_search_on_searched_target_is_immediate() {
        let mut rig = Rig::at(loc(3, 3));
        assert!(rig.grid.update_searched(loc(9, 9)).is_ok());
        let (status, _) = rig.run(&mut Plan::AreaSearch, loc(9, 9));
        assert_eq!(status, TaskStatus::Achieved);
        assert_eq!(rig.world.steps, 0);
    }

    #[test]
    fn unreachable_search_target_is_relabelled() {
        let mut rig = Rig::at(loc(3, 3));
        let target = loc(10, 10);
        let ring = [
            Offset::new(0, 1),
            Offset::new(0, -1),
            Offset::new(1, 0),
            Offset::new(-1, 0),
        ];
        assert!(rig.grid.update_obstructions(target, &ring).is_ok());
        let (status, events) = rig.run(&mut Plan::AreaSearch, target);
        assert_eq!(status, TaskStatus::Failed);
        assert!(events.contains(&PlanEvent::Unreachable(target)));
        assert!(!rig.grid.is_searchable(target));
    }

    #[test]
    fn fetch_grabs_and_reports() {
        let mut rig = Rig::at(loc(3, 3));
        let gold = loc(6, 3);
        rig.world.gold.insert(gold);
        if let Some(t) = rig.grid.tile_mut(gold) {
            t.set_glitter(true);
        }
        let mut plan = Plan::for_role(Role::Fetch);
        let mut grabbed = false;
        for _ in 0..10 {
            let (status, events) = rig.run(&mut plan, gold);
            grabbed |= events.contains(&PlanEvent::GoldGrabbed(gold));
            if !status.is_in_progress() {
                assert_eq!(status, TaskStatus::Achieved);
                break;
            }
        }
        assert!(grabbed);
        assert!(rig.kit.carrying_gold);
        assert!(rig.grid.tile(gold).is_some_and(|t| !t.has_glitter()));
    }

    #[test]
    fn fetch_fails_when_glitter_is_gone() {
        let mut rig = Rig::at(loc(3, 3));
        let (status, _) = rig.run(&mut Plan::Fetch, loc(9, 9));
        assert_eq!(status, TaskStatus::Failed);
    }

    #[test]
    fn fetch_fails_on_empty_grab() {
        let mut rig = Rig::at(loc(3, 3));
        if let Some(t) = rig.grid.tile_mut(loc(3, 3)) {
            t.set_glitter(true);
        }
        let (status, _) = rig.run(&mut Plan::Fetch, loc(3, 3));
        assert_eq!(status, TaskStatus::Failed);
        assert!(!rig.kit.carrying_gold);
    }

    #[test]
    fn return_delivers_gold() {
        let mut rig = Rig::at(loc(6, 6));
        rig.kit.carrying_gold = true;
        rig.world.carrying = true;
        let status = rig.run_until_done(&mut Plan::Return, loc(2, 3), 20);
        assert_eq!(status, TaskStatus::Achieved);
        assert!(!rig.kit.carrying_gold);
        assert_eq!(rig.world.deposited, 1);
    }

    #[test]
    fn return_without_gold_is_trivially_done() {
        let mut rig = Rig::at(loc(6, 6));
        let (status, _) = rig.run(&mut Plan::Return, loc(2, 3));
        assert_eq!(status, TaskStatus::Achieved);
        assert_eq!(rig.world.steps, 0);
    }

    #[test]
    fn firing_positions_are_in_line_and_sorted() {
        let grid = Grid::new();
        let target = loc(10, 10);
        let positions = firing_positions(&grid, target, loc(10, 3));
        assert_eq!(positions.len(), 16);
        assert!(positions.iter().all(|p| p.in_line(target)));
        assert_eq!(positions.front(), Some(&loc(10, 6)));
    }

    #[test]
    fn firing_positions_respect_line_of_fire() {
        let mut grid = Grid::new();
        let target = loc(10, 10);
        if let Some(t) = grid.tile_mut(loc(10, 8)) {
            t.set_obstruction(true);
        }
        let positions = firing_positions(&grid, target, loc(10, 3));
        assert!(!positions.contains(&loc(10, 7)));
        assert!(!positions.contains(&loc(10, 6)));
        assert!(positions.contains(&loc(10, 9)));
    }

    #[test]
    fn hunt_moves_into_line_and_fires() {
        let mut rig = Rig::at(loc(14, 14));
        let monster = loc(10, 10);
        rig.world.monsters.insert(monster);
        rig.suspect(monster);
        rig.kit.ammo = 2;

        let mut plan = Plan::for_role(Role::Hunt);
        let mut killed = false;
        for _ in 0..30 {
            let (status, events) = rig.run(&mut plan, monster);
            killed |= events.contains(&PlanEvent::MonsterKilled(monster));
            if !status.is_in_progress() {
                assert_eq!(status, TaskStatus::Achieved);
                break;
            }
        }
        assert!(killed);
        assert_eq!(rig.kit.ammo, 1);
        assert!(!rig.grid.is_monster(monster));
        assert!(rig.world.monsters.is_empty());
    }

    #[test]
    fn hunt_without_ammo_fails() {
        let mut rig = Rig::at(loc(10, 6));
        rig.suspect(loc(10, 10));
        let (status, _) = rig.run(&mut Plan::for_role(Role::Hunt), loc(10, 10));
        assert_eq!(status, TaskStatus::Failed);
        assert_eq!(rig.world.shots, 0);
    }

    #[test]
    fn hunt_of_vanished_monster_is_done() {
        let mut rig = Rig::at(loc(10, 6));
        rig.kit.ammo = 1;
        let (status, _) = rig.run(&mut Plan::for_role(Role::Hunt), loc(10, 10));
        assert_eq!(status, TaskStatus::Achieved);
    }

    #[test]
    fn can_fire_needs_clear_line() {
        let mut rig = Rig::at(loc(1, 1));
        let monster = loc(10, 10);
        rig.suspect(monster);
        assert!(can_fire(&rig.grid, loc(10, 7), monster));
        assert!(!can_fire(&rig.grid, loc(11, 7), monster));
        assert!(!can_fire(&rig.grid, loc(10, 5), monster));
        if let Some(t) = rig.grid.tile_mut(loc(10, 8)) {
            t.set_obstruction(true);
        }
        assert!(!can_fire(&rig.grid, loc(10, 7), monster));
    }
}
