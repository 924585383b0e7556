//! Configuration loading and typed config structures for the explorer.
//!
//! The canonical configuration lives in `wumpus-config.yaml` in the working
//! directory. This module defines strongly-typed structs that mirror the
//! YAML structure and a loader that reads and validates the file. Every
//! field has a default, so an empty file (or no file at all) describes the
//! standard 47x26 world with a mixed team of four robots.

use std::path::Path;

use serde::{Deserialize, Serialize};
use wumpus_agents::{AgentConfig, COLLISION_RETRY_LIMIT, DEFAULT_RETURN_LOCATIONS};
use wumpus_types::{AgentKind, Bounds, Location, MAX_X, MAX_Y};
use wumpus_world::InferenceConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible setup.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `wumpus-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// World generation settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// The team of agents.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Wall and monster inference thresholds.
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Run-loop settings.
    #[serde(default)]
    pub simulation: RunConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if it fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if it fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bounds = self.world.bounds();
        if bounds.width() < 3 || bounds.height() < 3 {
            return Err(invalid(format!(
                "world must be at least 3x3 usable cells, got max_x={} max_y={}",
                self.world.max_x, self.world.max_y
            )));
        }
        if self.world.return_locations.is_empty() {
            return Err(invalid("at least one return location is required".to_owned()));
        }
        if let Some(site) = self
            .world
            .return_locations
            .iter()
            .find(|l| !bounds.contains(**l))
        {
            return Err(invalid(format!("return location {site} is off the map")));
        }
        if self.agents.roster.is_empty() {
            return Err(invalid("the agent roster is empty".to_owned()));
        }
        for (i, agent) in self.agents.roster.iter().enumerate() {
            if !bounds.contains(agent.start) {
                return Err(invalid(format!(
                    "agent {} ({}) starts off the map at {}",
                    i, agent.name, agent.start
                )));
            }
            let shared = self
                .agents
                .roster
                .iter()
                .skip(i.saturating_add(1))
                .any(|other| other.start == agent.start);
            if shared {
                return Err(invalid(format!("two agents start at {}", agent.start)));
            }
        }
        Ok(())
    }

    /// The roster with world-level settings folded in.
    ///
    /// Every agent gets the section's collision retry limit and the world's
    /// return locations. Agents without an explicit seed get one derived
    /// from the world seed and their roster position.
    pub fn agent_configs(&self) -> Vec<AgentConfig> {
        self.agents
            .roster
            .iter()
            .zip(1_u64..)
            .map(|(agent, n)| {
                let mut agent = agent.clone();
                agent.collision_retry_limit = self.agents.collision_retry_limit;
                agent.return_locations.clone_from(&self.world.return_locations);
                if agent.seed == 0 {
                    agent.seed = self.world.seed.wrapping_mul(31).wrapping_add(n);
                }
                agent
            })
            .collect()
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

/// World generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Random seed for reproducible worlds.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Exclusive upper bound of the x axis.
    #[serde(default = "default_max_x")]
    pub max_x: i32,

    /// Exclusive upper bound of the y axis.
    #[serde(default = "default_max_y")]
    pub max_y: i32,

    /// Number of interior wall cells.
    #[serde(default = "default_walls")]
    pub walls: u32,

    /// Number of pits.
    #[serde(default = "default_pits")]
    pub pits: u32,

    /// Number of monsters.
    #[serde(default = "default_monsters")]
    pub monsters: u32,

    /// Number of gold pieces.
    #[serde(default = "default_gold")]
    pub gold: u32,

    /// Cells where gold may be delivered.
    #[serde(default = "default_return_locations")]
    pub return_locations: Vec<Location>,

    /// How far a shot travels, in cells.
    #[serde(default = "default_fire_range")]
    pub fire_range: u32,
}

impl WorldConfig {
    /// The world's extent.
    pub const fn bounds(&self) -> Bounds {
        Bounds::new(self.max_x, self.max_y)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            max_x: default_max_x(),
            max_y: default_max_y(),
            walls: default_walls(),
            pits: default_pits(),
            monsters: default_monsters(),
            gold: default_gold(),
            return_locations: default_return_locations(),
            fire_range: default_fire_range(),
        }
    }
}

/// The team of agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// One entry per agent.
    #[serde(default = "default_roster")]
    pub roster: Vec<AgentConfig>,

    /// Collision retries per destination, applied to every agent.
    #[serde(default = "default_collision_retry_limit")]
    pub collision_retry_limit: u32,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            roster: default_roster(),
            collision_retry_limit: default_collision_retry_limit(),
        }
    }
}

/// How agents are driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Deterministic round-robin on one thread.
    #[default]
    Lockstep,
    /// One async task per agent sharing the world behind a lock.
    Concurrent,
}

/// Run-loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Upper bound on ticks (lockstep) or cycles per agent (concurrent).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Pause between cycles in concurrent mode, in milliseconds.
    #[serde(default)]
    pub tick_interval_ms: u64,

    /// How agents are driven.
    #[serde(default)]
    pub mode: RunMode,

    /// Capacity of the map broadcast channel in concurrent mode.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            tick_interval_ms: 0,
            mode: RunMode::default(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_max_x() -> i32 {
    MAX_X
}

const fn default_max_y() -> i32 {
    MAX_Y
}

const fn default_walls() -> u32 {
    40
}

const fn default_pits() -> u32 {
    20
}

const fn default_monsters() -> u32 {
    8
}

const fn default_gold() -> u32 {
    10
}

fn default_return_locations() -> Vec<Location> {
    DEFAULT_RETURN_LOCATIONS.to_vec()
}

const fn default_fire_range() -> u32 {
    wumpus_agents::TARGETING_RANGE
}

fn default_roster() -> Vec<AgentConfig> {
    vec![
        AgentConfig::new("scout", AgentKind::Explorer, Location::new(1, 1)),
        AgentConfig::new("digger-1", AgentKind::GoldDigger, Location::new(2, 2)),
        AgentConfig::new("hunter", AgentKind::HunterKiller, Location::new(1, 2)),
        AgentConfig::new("digger-2", AgentKind::GoldDigger, Location::new(2, 1)),
    ]
}

const fn default_collision_retry_limit() -> u32 {
    COLLISION_RETRY_LIMIT
}

const fn default_max_ticks() -> u64 {
    5_000
}

const fn default_channel_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_owned()
}
