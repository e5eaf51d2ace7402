//! Input validation for scheduling problems.
//!
//! Checks structural integrity of tasks and machines before a
//! [`ProblemInstance`](crate::models::ProblemInstance) is accepted into an
//! optimization run. Detects:
//! - Duplicate task or machine ids
//! - Predecessor references to unknown tasks
//! - Circular precedence dependencies (DAG validation)
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};

use crate::models::{MachineId, Task, TaskId, VirtualMachine};

/// Validation result: `Ok(())` or the full list of detected issues.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A single validation issue.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two tasks or two machines share the same id.
    DuplicateId,
    /// A task references a predecessor id that doesn't exist.
    InvalidPredecessor,
    /// The precedence graph contains a cycle.
    CyclicDependency,
    /// A task id, computation volume, or memory requirement is out of range.
    InvalidTask,
    /// A machine performance or memory value is out of range.
    InvalidMachine,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates tasks and machines for a scheduling problem.
///
/// Checks:
/// 1. No duplicate task ids, no duplicate machine ids.
/// 2. Every predecessor id refers to a task that exists.
/// 3. No circular precedence dependencies.
/// 4. Tasks have positive computation volume and non-negative memory.
/// 5. Machines have positive performance and non-negative memory.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with every detected issue.
pub fn validate_input(tasks: &[Task], machines: &[VirtualMachine]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut machine_ids: HashSet<MachineId> = HashSet::new();
    for m in machines {
        if !machine_ids.insert(m.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate machine id: {}", m.id),
            ));
        }
        if m.performance <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidMachine,
                format!("machine {} has non-positive performance", m.id),
            ));
        }
        if m.available_memory < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidMachine,
                format!("machine {} has negative available memory", m.id),
            ));
        }
    }

    let mut task_ids: HashSet<TaskId> = HashSet::new();
    for t in tasks {
        if !task_ids.insert(t.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate task id: {}", t.id),
            ));
        }
        if t.computation_volume <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTask,
                format!("task {} has non-positive computation volume", t.id),
            ));
        }
        if t.memory_requirement < 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidTask,
                format!("task {} has negative memory requirement", t.id),
            ));
        }
    }

    for t in tasks {
        for pred in &t.predecessor_ids {
            if !task_ids.contains(pred) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidPredecessor,
                    format!("task {} references unknown predecessor {}", t.id, pred),
                ));
            }
        }
    }

    if let Some(cycle_err) = detect_cycle(tasks) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects a cycle in the task precedence graph via DFS with a recursion
/// stack. Returns the first cycle found, if any.
fn detect_cycle(tasks: &[Task]) -> Option<ValidationError> {
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.id, t)).collect();

    let mut visited: HashSet<TaskId> = HashSet::new();
    let mut in_stack: HashSet<TaskId> = HashSet::new();

    for t in tasks {
        if !visited.contains(&t.id)
            && has_cycle_dfs(t.id, &by_id, &mut visited, &mut in_stack)
        {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("circular dependency detected involving task {}", t.id),
            ));
        }
    }

    None
}

fn has_cycle_dfs(
    node: TaskId,
    by_id: &HashMap<TaskId, &Task>,
    visited: &mut HashSet<TaskId>,
    in_stack: &mut HashSet<TaskId>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(task) = by_id.get(&node) {
        for &pred in &task.predecessor_ids {
            if in_stack.contains(&pred) {
                return true;
            }
            if !visited.contains(&pred) && has_cycle_dfs(pred, by_id, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(&node);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tasks() -> Vec<Task> {
        vec![
            Task::new(1, 10.0, 1.0),
            Task::new(2, 10.0, 1.0).with_predecessor(1),
            Task::new(3, 10.0, 1.0).with_predecessor(2),
        ]
    }

    fn sample_machines() -> Vec<VirtualMachine> {
        vec![VirtualMachine::new(1, 10.0, 10.0)]
    }

    #[test]
    fn test_valid_input() {
        assert!(validate_input(&sample_tasks(), &sample_machines()).is_ok());
    }

    #[test]
    fn test_duplicate_task_id() {
        let tasks = vec![Task::new(1, 10.0, 1.0), Task::new(1, 10.0, 1.0)];
        let errors = validate_input(&tasks, &sample_machines()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_invalid_predecessor() {
        let tasks = vec![Task::new(1, 10.0, 1.0).with_predecessor(99)];
        let errors = validate_input(&tasks, &sample_machines()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidPredecessor));
    }

    #[test]
    fn test_cyclic_dependency() {
        let tasks = vec![
            Task::new(1, 10.0, 1.0).with_predecessor(3),
            Task::new(2, 10.0, 1.0).with_predecessor(1),
            Task::new(3, 10.0, 1.0).with_predecessor(2),
        ];
        let errors = validate_input(&tasks, &sample_machines()).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::CyclicDependency));
    }

    #[test]
    fn test_non_positive_performance() {
        let machines = vec![VirtualMachine::new(1, 0.0, 10.0)];
        let errors = validate_input(&sample_tasks(), &machines).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::InvalidMachine));
    }

    #[test]
    fn test_fork_join_no_cycle() {
        let tasks = vec![
            Task::new(1, 10.0, 1.0),
            Task::new(2, 10.0, 1.0).with_predecessor(1),
            Task::new(3, 10.0, 1.0).with_predecessor(1),
            Task::new(4, 10.0, 1.0).with_predecessors([2, 3]),
        ];
        assert!(validate_input(&tasks, &sample_machines()).is_ok());
    }
}
