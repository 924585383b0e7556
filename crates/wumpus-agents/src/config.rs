//! Per-agent configuration.
//!
//! One [`AgentConfig`] describes one robot on the roster: what it can do,
//! where it starts, and the knobs of its movement and hunting behavior.
//! The simulation core reads a list of these from `wumpus-config.yaml`
//! under the `agents.roster` key.

use serde::{Deserialize, Serialize};
use wumpus_types::{AgentKind, Location};

/// Random-direction retries allowed per destination after a collision.
pub const COLLISION_RETRY_LIMIT: u32 = 25;

/// Rounds a hunter starts with.
pub const DEFAULT_AMMO: u32 = 3;

/// Where gold is delivered in the standard world.
pub const DEFAULT_RETURN_LOCATIONS: [Location; 2] = [Location::new(2, 3), Location::new(3, 2)];

/// Configuration for a single agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Display name used in logs and the report.
    pub name: String,

    /// Capability set.
    pub kind: AgentKind,

    /// Starting cell.
    pub start: Location,

    /// Rounds of ammunition (default: 3). Only hunters use it.
    #[serde(default = "default_ammo")]
    pub ammo: u32,

    /// Collision retries per destination (default: 25).
    #[serde(default = "default_collision_retry_limit")]
    pub collision_retry_limit: u32,

    /// Cells where gold may be delivered (default: `(2,3)` and `(3,2)`).
    #[serde(default = "default_return_locations")]
    pub return_locations: Vec<Location>,

    /// Seed for this agent's random choices (default: 0).
    #[serde(default)]
    pub seed: u64,
}

impl AgentConfig {
    /// Configuration with every optional field at its default.
    pub fn new(name: impl Into<String>, kind: AgentKind, start: Location) -> Self {
        Self {
            name: name.into(),
            kind,
            start,
            ammo: default_ammo(),
            collision_retry_limit: default_collision_retry_limit(),
            return_locations: default_return_locations(),
            seed: 0,
        }
    }

    /// Same configuration with a different seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

const fn default_ammo() -> u32 {
    DEFAULT_AMMO
}

const fn default_collision_retry_limit() -> u32 {
    COLLISION_RETRY_LIMIT
}

fn default_return_locations() -> Vec<Location> {
    DEFAULT_RETURN_LOCATIONS.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_applied() {
        let cfg = AgentConfig::new("scout", AgentKind::Explorer, Location::new(2, 2));
        assert_eq!(cfg.ammo, 3);
        assert_eq!(cfg.collision_retry_limit, 25);
        assert_eq!(
            cfg.return_locations,
            vec![Location::new(2, 3), Location::new(3, 2)]
        );
        assert_eq!(cfg.seed, 0);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let json = r#"{"name":"digger","kind":"gold_digger","start":{"x":4,"y":4}}"#;
        let cfg: Result<AgentConfig, _> = serde_json::from_str(json);
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.kind), Some(AgentKind::GoldDigger));
        assert_eq!(cfg.as_ref().map(|c| c.collision_retry_limit), Some(25));
        assert_eq!(cfg.map(|c| c.return_locations.len()), Some(2));
    }
}
