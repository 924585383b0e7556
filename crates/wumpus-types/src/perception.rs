//! Sensor readings an agent collects in one cycle.
//!
//! A [`Percept`] is the only information about the real world an agent
//! receives. Each field is `None` when the sensor was not read this cycle
//! (an agent skips sensors whose whole range is already resolved).

use serde::{Deserialize, Serialize};

use crate::location::{Location, Offset};

/// One of the four sensors every agent carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensor {
    /// Reports obstructions as offsets relative to the agent.
    Sonar,
    /// Reports whether a pit is nearby.
    Breeze,
    /// Reports whether a live monster is nearby.
    Smell,
    /// Reports whether gold is nearby.
    Glitter,
}

impl Sensor {
    /// All sensors, in the order an agent reads them.
    pub const ALL: [Self; 4] = [Self::Sonar, Self::Smell, Self::Breeze, Self::Glitter];
}

/// The readings taken at one location during one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Percept {
    /// Where the readings were taken.
    pub at: Option<Location>,
    /// Sonar returns, relative to `at`.
    pub sonar: Option<Vec<Offset>>,
    /// Breeze reading.
    pub breeze: Option<bool>,
    /// Smell reading.
    pub smell: Option<bool>,
    /// Glitter reading.
    pub glitter: Option<bool>,
}

impl Percept {
    /// An empty percept for readings taken at `at`.
    pub const fn at(at: Location) -> Self {
        Self {
            at: Some(at),
            sonar: None,
            breeze: None,
            smell: None,
            glitter: None,
        }
    }

    /// Whether the given sensor was read.
    pub const fn was_read(&self, sensor: Sensor) -> bool {
        match sensor {
            Sensor::Sonar => self.sonar.is_some(),
            Sensor::Breeze => self.breeze.is_some(),
            Sensor::Smell => self.smell.is_some(),
            Sensor::Glitter => self.glitter.is_some(),
        }
    }

    /// Number of sensors read.
    pub fn reads(&self) -> usize {
        Sensor::ALL.iter().filter(|s| self.was_read(**s)).count()
    }
}
