//! The per-agent task queue.
//!
//! The queue owns every task the agent holds and remembers which one is
//! currently executing. Each cycle the agent:
//!
//! 1. drops finished tasks ([`TaskQueue::cleanup`]),
//! 2. offers newly discovered work ([`TaskQueue::enqueue`],
//!    [`TaskQueue::discover_search_task`]),
//! 3. picks the best task ([`TaskQueue::select`]); switching tasks discards
//!    the plan of the one being left.

use tracing::debug;
use wumpus_types::{Location, Role, TaskId};

use crate::ranking;
use crate::task::Task;

/// Tasks held by one agent.
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    tasks: Vec<Task>,
    current: Option<TaskId>,
}

impl TaskQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            tasks: Vec::new(),
            current: None,
        }
    }

    /// Number of tasks held.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no tasks are held.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterate the held tasks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// The currently executing task's id.
    pub const fn current(&self) -> Option<TaskId> {
        self.current
    }

    /// Look up a task.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    /// Look up a task for modification.
    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id() == id)
    }

    /// Whether a live task with this role exists.
    pub fn has_role(&self, role: Role) -> bool {
        self.tasks
            .iter()
            .any(|t| t.role() == role && t.is_in_progress())
    }

    /// Add a task. Returns `false` (and drops it) if a live task with the
    /// same role and target is already held.
    pub fn enqueue(&mut self, task: Task) -> bool {
        let duplicate = self.tasks.iter().any(|t| {
            t.is_in_progress() && t.role() == task.role() && t.target() == task.target()
        });
        if duplicate {
            return false;
        }
        debug!(role = %task.role(), target = %task.target(), "task enqueued");
        self.tasks.push(task);
        true
    }

    /// Remove every task that is no longer in progress. Returns how many
    /// were removed.
    pub fn cleanup(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(Task::is_in_progress);
        before.saturating_sub(self.tasks.len())
    }

    /// Offer the nearest unsearched cell as an area-search target.
    ///
    /// The candidate replaces the existing area-search task only if it is
    /// strictly closer to `from`; otherwise the queue is unchanged. Returns
    /// whether a task was added.
    pub fn discover_search_task(&mut self, from: Location, candidate: Option<Location>) -> bool {
        let Some(candidate) = candidate else {
            return false;
        };
        let existing = self.tasks.iter().position(|t| t.role() == Role::AreaSearch);
        let existing_distance = existing
            .and_then(|i| self.tasks.get(i))
            .map_or(u32::MAX, |t| from.manhattan(t.target()));

        if from.manhattan(candidate) >= existing_distance {
            return false;
        }
        if let Some(i) = existing {
            let retired = self.tasks.remove(i);
            debug!(target = %retired.target(), replacement = %candidate, "area search retargeted");
        }
        self.enqueue(Task::new(Role::AreaSearch, candidate))
    }

    /// The best task as seen from `from`, without selecting it.
    pub fn best(&mut self, from: Location) -> Option<&Task> {
        self.sort(from);
        self.tasks.first()
    }

    /// Select the best task as seen from `from` and make it current.
    ///
    /// If a different task was current, its plan is discarded; the task
    /// itself stays queued. Returns the selected task's id, or `None` when
    /// the queue is empty.
    pub fn select(&mut self, from: Location) -> Option<TaskId> {
        self.sort(from);
        let best = self.tasks.first()?.id();
        if self.current != Some(best) {
            let previous_id = self.current;
            if let Some(previous) = previous_id.and_then(|id| self.get_mut(id)) {
                previous.reset_plan();
                debug!(role = %previous.role(), target = %previous.target(), "task preempted");
            }
            self.current = Some(best);
        }
        Some(best)
    }

    fn sort(&mut self, from: Location) {
        self.tasks.sort_by(|a, b| ranking::compare(from, a, b));
    }
}
