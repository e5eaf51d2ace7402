//! Problem instance model.
//!
//! A `ProblemInstance` bundles the tasks, the virtual machines, and the
//! penalty coefficients that turn constraint violations into fitness cost.
//! It is immutable for the duration of an optimization run and shared
//! read-only across worker threads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{MachineId, Task, TaskId, VirtualMachine};
use crate::validation::{self, ValidationError};

/// Default coefficient applied per unit of memory shortfall.
pub const DEFAULT_MEMORY_PENALTY_COEFFICIENT: f64 = 1000.0;
/// Default coefficient reserved for a future soft-precedence variant.
///
/// The list scheduler enforces precedence structurally (see
/// [`crate::scheduler::schedule`]), so this coefficient is currently unused
/// by the evaluator. It is carried on the instance so that a future
/// soft-precedence scheduler can read it without a schema change.
pub const DEFAULT_PRECEDENCE_PENALTY_COEFFICIENT: f64 = 1000.0;

/// A complete, validated scheduling problem: tasks, machines, and the
/// penalty coefficients used to score infeasible assignments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemInstance {
    tasks: HashMap<TaskId, Task>,
    machines: HashMap<MachineId, VirtualMachine>,
    /// Penalty charged per unit of memory shortfall on a hard violation.
    pub memory_penalty_coefficient: f64,
    /// Reserved for a future soft-precedence scheduler variant; unused by
    /// the list scheduler, which enforces precedence structurally.
    pub precedence_penalty_coefficient: f64,
}

impl ProblemInstance {
    /// Creates a new instance with default penalty coefficients.
    pub fn new(tasks: Vec<Task>, machines: Vec<VirtualMachine>) -> Self {
        Self {
            tasks: tasks.into_iter().map(|t| (t.id, t)).collect(),
            machines: machines.into_iter().map(|m| (m.id, m)).collect(),
            memory_penalty_coefficient: DEFAULT_MEMORY_PENALTY_COEFFICIENT,
            precedence_penalty_coefficient: DEFAULT_PRECEDENCE_PENALTY_COEFFICIENT,
        }
    }

    /// Overrides the memory penalty coefficient, returning `self` for chaining.
    pub fn with_memory_penalty_coefficient(mut self, coefficient: f64) -> Self {
        self.memory_penalty_coefficient = coefficient;
        self
    }

    /// Overrides the precedence penalty coefficient, returning `self` for chaining.
    pub fn with_precedence_penalty_coefficient(mut self, coefficient: f64) -> Self {
        self.precedence_penalty_coefficient = coefficient;
        self
    }

    /// Looks up a task by id.
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Looks up a machine by id.
    pub fn machine(&self, id: MachineId) -> Option<&VirtualMachine> {
        self.machines.get(&id)
    }

    /// All tasks, in ascending id order (deterministic for list scheduling).
    pub fn tasks_sorted(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.values().collect();
        tasks.sort_by_key(|t| t.id);
        tasks
    }

    /// All machines, in ascending id order.
    pub fn machines_sorted(&self) -> Vec<&VirtualMachine> {
        let mut machines: Vec<&VirtualMachine> = self.machines.values().collect();
        machines.sort_by_key(|m| m.id);
        machines
    }

    /// Number of tasks in the instance.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Number of machines in the instance.
    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    /// All task ids, in ascending order.
    pub fn task_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.tasks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// All machine ids, in ascending order.
    pub fn machine_ids(&self) -> Vec<MachineId> {
        let mut ids: Vec<MachineId> = self.machines.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Whether the precedence graph is a DAG and all structural invariants
    /// hold (unique ids, valid predecessor references, positive performance
    /// and computation volume). See [`crate::validation`] for the detailed
    /// error list.
    pub fn validate(&self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Full list of structural validation errors, empty if the instance is valid.
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        let tasks: Vec<Task> = self.tasks_sorted().into_iter().cloned().collect();
        let machines: Vec<VirtualMachine> = self.machines_sorted().into_iter().cloned().collect();
        match validation::validate_input(&tasks, &machines) {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_defaults() {
        let instance = ProblemInstance::new(
            vec![Task::new(1, 10.0, 5.0)],
            vec![VirtualMachine::new(1, 10.0, 10.0)],
        );
        assert_eq!(
            instance.memory_penalty_coefficient,
            DEFAULT_MEMORY_PENALTY_COEFFICIENT
        );
        assert!(instance.validate());
    }

    #[test]
    fn test_instance_invalid_cycle() {
        let instance = ProblemInstance::new(
            vec![
                Task::new(1, 10.0, 1.0).with_predecessor(2),
                Task::new(2, 10.0, 1.0).with_predecessor(1),
            ],
            vec![VirtualMachine::new(1, 10.0, 10.0)],
        );
        assert!(!instance.validate());
    }

    #[test]
    fn test_tasks_sorted_deterministic() {
        let instance = ProblemInstance::new(
            vec![
                Task::new(3, 10.0, 1.0),
                Task::new(1, 10.0, 1.0),
                Task::new(2, 10.0, 1.0),
            ],
            vec![VirtualMachine::new(1, 10.0, 10.0)],
        );
        let ids: Vec<_> = instance.tasks_sorted().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
