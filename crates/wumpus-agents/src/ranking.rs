//! Task ordering.
//!
//! Tasks are ranked by role priority (highest first), then by proximity of
//! the target to the agent using the shared `(distance, x, y)` key. The
//! order is total over distinct `(role, target)` pairs, so re-sorting every
//! cycle is deterministic.

use core::cmp::{Ordering, Reverse};

use wumpus_types::Location;

use crate::task::Task;

/// Sort key for `task` as seen from `from`. Smaller ranks first.
pub fn rank_key(task: &Task, from: Location) -> (Reverse<u32>, (u32, i32, i32)) {
    (
        Reverse(task.role().priority()),
        task.target().proximity_key(from),
    )
}

/// Compare two tasks as seen from `from`.
pub fn compare(from: Location, a: &Task, b: &Task) -> Ordering {
    rank_key(a, from).cmp(&rank_key(b, from))
}
