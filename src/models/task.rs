//! Task model.
//!
//! A task is the atomic unit of scheduling: a single piece of work with an
//! abstract computational cost, a memory footprint, and precedence
//! dependencies on other tasks. Unlike job-shop "activities", a task here
//! is never split across resources — it runs start-to-finish on exactly
//! one virtual machine.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique task identifier. Positive and unique within a [`ProblemInstance`](super::ProblemInstance).
pub type TaskId = u64;

/// A compute task to be scheduled onto a virtual machine.
///
/// # Transient fields
///
/// `start_time`, `completion_time`, and `assigned_machine_id` are populated
/// by the scheduler on a private, per-evaluation copy of the task. They are
/// never set on the canonical instance and are meaningless until a schedule
/// has been computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier (positive, unique within the instance).
    pub id: TaskId,
    /// Abstract amount of work this task requires (work units).
    pub computation_volume: f64,
    /// Memory required while this task executes.
    pub memory_requirement: f64,
    /// Ids of tasks that must complete before this one may start.
    pub predecessor_ids: BTreeSet<TaskId>,

    /// Start time on the assigned machine, as of the last evaluation.
    pub start_time: Option<f64>,
    /// Completion time on the assigned machine, as of the last evaluation.
    pub completion_time: Option<f64>,
    /// Machine this task was assigned to, as of the last evaluation.
    pub assigned_machine_id: Option<u64>,
}

impl Task {
    /// Creates a new task with no predecessors and no transient schedule state.
    pub fn new(id: TaskId, computation_volume: f64, memory_requirement: f64) -> Self {
        Self {
            id,
            computation_volume,
            memory_requirement,
            predecessor_ids: BTreeSet::new(),
            start_time: None,
            completion_time: None,
            assigned_machine_id: None,
        }
    }

    /// Adds a predecessor id, returning `self` for chaining.
    pub fn with_predecessor(mut self, predecessor_id: TaskId) -> Self {
        self.predecessor_ids.insert(predecessor_id);
        self
    }

    /// Adds several predecessor ids, returning `self` for chaining.
    pub fn with_predecessors(mut self, predecessor_ids: impl IntoIterator<Item = TaskId>) -> Self {
        self.predecessor_ids.extend(predecessor_ids);
        self
    }

    /// Clears all transient per-evaluation fields, returning a pristine copy
    /// suitable as scheduler scratch state.
    pub fn reset_transient(&self) -> Self {
        Self {
            id: self.id,
            computation_volume: self.computation_volume,
            memory_requirement: self.memory_requirement,
            predecessor_ids: self.predecessor_ids.clone(),
            start_time: None,
            completion_time: None,
            assigned_machine_id: None,
        }
    }

    /// Whether this task has no predecessors (eligible to start immediately).
    pub fn is_root(&self) -> bool {
        self.predecessor_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let t = Task::new(1, 10.0, 5.0)
            .with_predecessor(2)
            .with_predecessor(3);
        assert_eq!(t.id, 1);
        assert_eq!(t.predecessor_ids.len(), 2);
        assert!(t.predecessor_ids.contains(&2));
        assert!(!t.is_root());
    }

    #[test]
    fn test_task_is_root() {
        let t = Task::new(1, 10.0, 5.0);
        assert!(t.is_root());
    }

    #[test]
    fn test_reset_transient() {
        let mut t = Task::new(1, 10.0, 5.0);
        t.start_time = Some(1.0);
        t.completion_time = Some(2.0);
        t.assigned_machine_id = Some(7);
        let fresh = t.reset_transient();
        assert_eq!(fresh.start_time, None);
        assert_eq!(fresh.completion_time, None);
        assert_eq!(fresh.assigned_machine_id, None);
        assert_eq!(fresh.id, t.id);
    }
}
