//! The end-of-run report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wumpus_agents::{Agent, AgentSummary};
use wumpus_world::{Grid, WorldError};

use crate::config::RunMode;
use crate::environment::Environment;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every agent is done or dead.
    AllAgentsFinished,
    /// The tick limit was reached first.
    MaxTicksReached,
}

/// Facts about the run itself, gathered by the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunInfo {
    /// How agents were driven.
    pub mode: RunMode,
    /// World seed.
    pub seed: u64,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Ticks (lockstep) or the longest agent's cycles (concurrent).
    pub ticks: u64,
    /// Why the run stopped.
    pub end_reason: EndReason,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// How agents were driven.
    pub mode: RunMode,
    /// World seed.
    pub seed: u64,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Ticks executed.
    pub ticks: u64,
    /// Why the run stopped.
    pub end_reason: EndReason,
    /// Gold delivered to return sites.
    pub gold_deposited: u32,
    /// Gold left in the world.
    pub gold_remaining: usize,
    /// Monsters shot.
    pub monsters_killed: u32,
    /// Monsters left alive.
    pub monsters_remaining: usize,
    /// Agents lost to pits.
    pub deaths: u32,
    /// Share of cells explored on the union of every agent's map.
    pub explored_fraction: f64,
    /// One entry per agent, in roster order.
    pub agents: Vec<AgentSummary>,
}

impl SimulationReport {
    /// Assemble the report from the final state of a run.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the agents' maps cannot be merged.
    pub fn build(run: &RunInfo, env: &Environment, agents: &[Agent]) -> Result<Self, WorldError> {
        Ok(Self {
            mode: run.mode,
            seed: run.seed,
            started_at: run.started_at,
            finished_at: Utc::now(),
            ticks: run.ticks,
            end_reason: run.end_reason,
            gold_deposited: env.gold_deposited(),
            gold_remaining: env.gold_remaining(),
            monsters_killed: env.monsters_killed(),
            monsters_remaining: env.monsters_remaining(),
            deaths: env.deaths(),
            explored_fraction: explored_fraction(agents)?,
            agents: agents.iter().map(Agent::summary).collect(),
        })
    }
}

/// Share of cells explored on the union of the agents' maps.
///
/// # Errors
///
/// Returns [`WorldError::BoundsMismatch`] if the maps differ in extent.
pub fn explored_fraction(agents: &[Agent]) -> Result<f64, WorldError> {
    let Some(first) = agents.first() else {
        return Ok(0.0);
    };
    let mut merged = Grid::with_bounds(first.grid().bounds(), first.grid().inference());
    for agent in agents {
        merged.merge_from(agent.grid())?;
    }
    Ok(ratio(merged.explored_count(), merged.tile_count()))
}

fn ratio(part: usize, whole: usize) -> f64 {
    match (u32::try_from(part), u32::try_from(whole)) {
        (Ok(p), Ok(w)) if w > 0 => f64::from(p) / f64::from(w),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use wumpus_agents::AgentConfig;
    use wumpus_types::{AgentKind, Bounds, Location};
    use wumpus_world::InferenceConfig;

    use super::*;

    fn agent(start: Location) -> Agent {
        let cfg = AgentConfig::new("a", AgentKind::Explorer, start);
        Agent::new(&cfg, Bounds::new(6, 6), InferenceConfig::default())
    }

    #[test]
    fn ratio_handles_empty_maps() {
        assert!(ratio(0, 0).abs() < f64::EPSILON);
        assert!((ratio(5, 10) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn no_agents_explored_nothing() {
        assert!(explored_fraction(&[]).is_ok_and(|f| f.abs() < f64::EPSILON));
    }

    #[test]
    fn fresh_agents_explored_nothing() {
        let agents = [agent(Location::new(1, 1)), agent(Location::new(4, 4))];
        assert!(explored_fraction(&agents).is_ok_and(|f| f.abs() < f64::EPSILON));
    }

    #[test]
    fn report_serializes_to_json() {
        let env = Environment::empty(Bounds::new(6, 6), vec![Location::new(2, 3)], 4);
        let agents = [agent(Location::new(1, 1))];
        let run = RunInfo {
            mode: RunMode::Lockstep,
            seed: 1,
            started_at: Utc::now(),
            ticks: 0,
            end_reason: EndReason::MaxTicksReached,
        };
        let report = SimulationReport::build(&run, &env, &agents);
        assert!(report.is_ok());
        let json = report.ok().and_then(|r| serde_json::to_string(&r).ok());
        assert!(json.is_some_and(|j| j.contains("\"end_reason\":\"max_ticks_reached\"")));
    }
}
