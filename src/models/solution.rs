//! Solution (schedule) model.
//!
//! A `Solution` is the complete output of evaluating an [`Assignment`]
//! through the scheduler: the assignment itself, its makespan and penalty,
//! and enough per-task/per-machine detail to drive visualization and a
//! feasibility audit.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{MachineId, TaskId};

/// A total function from task id to machine id.
///
/// A valid assignment has one entry per task in the owning
/// [`ProblemInstance`](super::ProblemInstance) and every value refers to a
/// machine that exists in that instance.
pub type Assignment = HashMap<TaskId, MachineId>;

/// Per-task timing snapshot captured by a single schedule evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSchedule {
    /// The task being described.
    pub task_id: TaskId,
    /// The machine it ran on.
    pub machine_id: MachineId,
    /// When it started.
    pub start_time: f64,
    /// When it finished.
    pub completion_time: f64,
}

/// Per-machine timeline snapshot captured by a single schedule evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSchedule {
    /// The machine being described.
    pub machine_id: MachineId,
    /// Task ids assigned to this machine, in execution order.
    pub task_ids: Vec<TaskId>,
    /// Completion time of the last task on this machine (0 if idle).
    pub last_completion_time: f64,
}

/// The outcome of evaluating one [`Assignment`]: a makespan, a penalty, and
/// enough detail to reconstruct the schedule for visualization.
///
/// `fitness = makespan + total_penalty`. When a hard constraint is
/// violated, `makespan` is `f64::INFINITY` and `fitness` is as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    /// The assignment this solution was computed from.
    pub assignment: Assignment,
    /// Maximum completion time across all tasks, or `+inf` on hard violation.
    pub makespan: f64,
    /// Accumulated penalty from hard-constraint violations (>= 0).
    pub total_penalty: f64,
    /// Best-known fitness at each iteration/generation of the run that
    /// produced this solution (monotone non-increasing).
    pub fitness_history: Vec<f64>,
    /// Wall-clock time spent computing the run that produced this solution.
    pub computation_time: Duration,
    /// Iteration/generation index at which this solution was first found.
    pub iteration_found: usize,
    /// Per-task timing, keyed by task id.
    pub task_schedules: HashMap<TaskId, TaskSchedule>,
    /// Per-machine timeline, keyed by machine id.
    pub machine_schedules: HashMap<MachineId, MachineSchedule>,
}

impl Solution {
    /// Fitness: `makespan + total_penalty`. Lower is better.
    pub fn fitness(&self) -> f64 {
        self.makespan + self.total_penalty
    }

    /// A solution representing a single infeasible, unevaluated candidate
    /// (e.g. when the scheduler fails to evaluate a candidate). Per the
    /// failure-isolation policy, this sentinel lets search continue instead
    /// of propagating an error.
    pub fn infeasible_sentinel(assignment: Assignment) -> Self {
        Self {
            assignment,
            makespan: f64::INFINITY,
            total_penalty: 0.0,
            fitness_history: Vec::new(),
            computation_time: Duration::ZERO,
            iteration_found: 0,
            task_schedules: HashMap::new(),
            machine_schedules: HashMap::new(),
        }
    }

    /// Whether this solution violates no hard constraints.
    pub fn is_feasible(&self) -> bool {
        self.makespan.is_finite()
    }
}
