//! A unit of work an agent holds in its queue.

use serde::{Deserialize, Serialize};
use wumpus_types::{Location, Role, TaskId, TaskStatus};

use crate::plan::Plan;

/// A role to play against a target cell.
///
/// The plan is the role's execution state. It is created lazily the first
/// time the task is selected and discarded whenever another task preempts
/// this one; the task itself survives preemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    role: Role,
    target: Location,
    status: TaskStatus,
    plan: Option<Plan>,
}

impl Task {
    /// Create an in-progress task with no plan yet.
    pub fn new(role: Role, target: Location) -> Self {
        Self {
            id: TaskId::new(),
            role,
            target,
            status: TaskStatus::InProgress,
            plan: None,
        }
    }

    /// Unique identifier.
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// The role this task is played under.
    pub const fn role(&self) -> Role {
        self.role
    }

    /// The cell this task is about.
    pub const fn target(&self) -> Location {
        self.target
    }

    /// Current lifecycle status.
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Whether the task is still live.
    pub const fn is_in_progress(&self) -> bool {
        self.status.is_in_progress()
    }

    /// Record the outcome of the task.
    pub const fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    /// Whether an execution plan is attached.
    pub const fn has_plan(&self) -> bool {
        self.plan.is_some()
    }

    /// Detach the execution plan, if any.
    pub const fn take_plan(&mut self) -> Option<Plan> {
        self.plan.take()
    }

    /// Attach an execution plan.
    pub fn set_plan(&mut self, plan: Plan) {
        self.plan = Some(plan);
    }

    /// Discard the execution plan, keeping the task.
    pub fn reset_plan(&mut self) {
        self.plan = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_is_live_without_plan() {
        let t = Task::new(Role::Fetch, Location::new(4, 4));
        assert!(t.is_in_progress());
        assert!(!t.has_plan());
        assert_eq!(t.role(), Role::Fetch);
        assert_eq!(t.target(), Location::new(4, 4));
    }

    #[test]
    fn plan_can_be_reset() {
        let mut t = Task::new(Role::AreaSearch, Location::new(4, 4));
        t.set_plan(Plan::for_role(Role::AreaSearch));
        assert!(t.has_plan());
        t.reset_plan();
        assert!(!t.has_plan());
        assert!(t.is_in_progress());
    }

    #[test]
    fn status_leaves_in_progress() {
        let mut t = Task::new(Role::Hunt, Location::new(4, 4));
        t.set_status(TaskStatus::Failed);
        assert!(!t.is_in_progress());
    }
}
