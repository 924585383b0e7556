//! Enumeration types for the Wumpus World explorer.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// The role an agent plays while pursuing a task.
///
/// Each role carries a fixed priority; when an agent holds several tasks,
/// the role with the higher priority is always pursued first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Walk to an unsearched cell so its neighborhood gets sensed.
    AreaSearch,
    /// Move into a firing position and shoot a suspected monster.
    Hunt,
    /// Walk to a glittering cell and pick up the gold.
    Fetch,
    /// Carry held gold back to a return location.
    Return,
}

impl Role {
    /// Fixed priority for this role. Higher wins.
    pub const fn priority(self) -> u32 {
        match self {
            Self::AreaSearch => 10,
            Self::Hunt => 20,
            Self::Fetch => 30,
            Self::Return => 40,
        }
    }

    /// Short name used in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AreaSearch => "area_search",
            Self::Hunt => "hunt",
            Self::Fetch => "fetch",
            Self::Return => "return",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Task lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Still being worked on.
    InProgress,
    /// Finished successfully.
    Achieved,
    /// Abandoned; the goal could not be met.
    Failed,
}

impl TaskStatus {
    /// Whether the task is still live.
    pub const fn is_in_progress(self) -> bool {
        matches!(self, Self::InProgress)
    }
}

// ---------------------------------------------------------------------------
// Agent kinds
// ---------------------------------------------------------------------------

/// The capability set an agent is built with.
///
/// Every kind searches areas; diggers additionally fetch gold and hunters
/// additionally hunt monsters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Searches only.
    Explorer,
    /// Searches and fetches gold.
    GoldDigger,
    /// Searches and hunts monsters while ammunition lasts.
    HunterKiller,
}

impl AgentKind {
    /// Whether agents of this kind can hold the given role.
    pub const fn can_play(self, role: Role) -> bool {
        match role {
            Role::AreaSearch => true,
            Role::Hunt => matches!(self, Self::HunterKiller),
            Role::Fetch | Role::Return => matches!(self, Self::GoldDigger),
        }
    }
}
