//! Reading sensors and folding the results into the map.
//!
//! Each sensor is only read when some cell in its range still has something
//! to learn. Once a neighborhood is fully resolved the agent skips the
//! sensor, which keeps the number of world queries proportional to the
//! amount of unexplored territory.

use wumpus_types::{AgentId, Location, Metric, Percept};
use wumpus_world::{
    BREEZE_METRIC, BREEZE_RANGE, GLITTER_METRIC, GLITTER_RANGE, Grid, SMELL_METRIC, SMELL_RANGE,
    SONAR_METRIC, SONAR_RANGE, Tile,
};

use crate::error::AgentError;
use crate::port::WorldPort;

/// What one sensor sweep produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorSweep {
    /// The readings that were taken.
    pub percept: Percept,
    /// Whether any tile changed.
    pub changed: bool,
}

/// Read whichever sensors are still useful at `at` and fuse the results.
///
/// `prev` is where the agent stood before its last step; it narrows the
/// cells a positive reading can implicate. The agent's own cell is marked
/// visited first and it and its four neighbors are marked searched last.
///
/// # Errors
///
/// Returns [`AgentError::Port`] if a sensor read fails, or
/// [`AgentError::World`] if `at` is off the map.
pub fn read_sensors<P: WorldPort + ?Sized>(
    agent: AgentId,
    grid: &mut Grid,
    port: &mut P,
    prev: Option<Location>,
    at: Location,
) -> Result<SensorSweep, AgentError> {
    let mut percept = Percept::at(at);
    let mut changed = grid.update_visited(at)?;

    if any_in_range(grid, at, SONAR_RANGE, SONAR_METRIC, |t| {
        !t.has_obstruction() && !t.has_searched() && !t.has_visited()
    }) {
        let returns = port.sonar(agent)?;
        changed |= grid.update_obstructions(at, &returns)?;
        percept.sonar = Some(returns);
    }

    if any_in_range(grid, at, SMELL_RANGE, SMELL_METRIC, |t| {
        t.has_smell() || (!t.has_obstruction() && !t.has_searched())
    }) {
        let reading = port.smell(agent)?;
        changed |= grid.update_smell(prev, at, reading)?;
        percept.smell = Some(reading);
    }

    if any_in_range(grid, at, BREEZE_RANGE, BREEZE_METRIC, |t| {
        t.has_breeze() || (!t.has_obstruction() && !t.has_searched())
    }) {
        let reading = port.breeze(agent)?;
        changed |= grid.update_breeze(prev, at, reading)?;
        percept.breeze = Some(reading);
    }

    if any_in_range(grid, at, GLITTER_RANGE, GLITTER_METRIC, |t| {
        t.has_glitter() || (!t.has_obstruction() && !t.has_searched() && !t.is_dangerous())
    }) {
        let reading = port.glitter(agent)?;
        changed |= grid.update_glitter(prev, at, reading)?;
        percept.glitter = Some(reading);
    }

    changed |= grid.update_searched(at)?;
    Ok(SensorSweep { percept, changed })
}

fn any_in_range<F>(grid: &Grid, at: Location, range: u32, metric: Metric, pred: F) -> bool
where
    F: Fn(&Tile) -> bool,
{
    grid.neighbors(at, range, metric)
        .into_iter()
        .filter_map(|n| grid.tile(n))
        .any(pred)
}
