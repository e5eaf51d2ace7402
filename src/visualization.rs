//! Chart-ready projections of a [`Solution`].
//!
//! Pure functions over a `Solution` (and the `ProblemInstance` it was
//! computed from) that reshape scheduler output into tables an external
//! renderer (Gantt chart, timeline, line chart) can consume directly. None
//! of these functions mutate their inputs or fail; an infeasible solution
//! (`makespan = +inf`) simply yields empty or zeroed projections where
//! timing is undefined.

use serde::{Deserialize, Serialize};

use crate::models::{MachineId, ProblemInstance, Solution, TaskId};

/// One row of a Gantt chart: a single task's execution interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttRow {
    /// The task this row describes.
    pub task_id: TaskId,
    /// The machine it ran on.
    pub machine_id: MachineId,
    /// When it started.
    pub start_time: f64,
    /// When it finished.
    pub completion_time: f64,
}

/// A machine's execution timeline and utilization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineTimeline {
    /// The machine this timeline describes.
    pub machine_id: MachineId,
    /// Task ids assigned to this machine, in execution order.
    pub task_ids: Vec<TaskId>,
    /// Fraction of the makespan this machine spent executing tasks, in
    /// `[0, 1]`. `0.0` when the makespan is zero or infinite.
    pub utilization: f64,
}

/// One point of the best-fitness-over-time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessPoint {
    /// Iteration/generation index.
    pub iteration: usize,
    /// Best-known fitness at that iteration.
    pub fitness: f64,
}

/// Raw per-machine load inputs for an (out-of-scope) utilization report.
/// This crate exposes the numbers; it never computes a quality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineLoad {
    /// The machine this load summary describes.
    pub machine_id: MachineId,
    /// Sum of `computation_volume` across tasks assigned to this machine.
    pub total_computation_assigned: f64,
    /// Number of tasks assigned to this machine.
    pub task_count: usize,
}

/// The complete set of projections for one solution, bundled for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationData {
    /// Gantt chart rows, sorted by `(machine_id, start_time)`.
    pub gantt_rows: Vec<GanttRow>,
    /// Per-machine timelines, sorted by `machine_id`.
    pub machine_timelines: Vec<MachineTimeline>,
    /// Best-fitness-over-time series.
    pub fitness_series: Vec<FitnessPoint>,
    /// Per-machine load summary, sorted by `machine_id`.
    pub machine_loads: Vec<MachineLoad>,
}

/// Builds a Gantt chart row per scheduled task, sorted by
/// `(machine_id, start_time)`.
pub fn gantt_rows(solution: &Solution) -> Vec<GanttRow> {
    let mut rows: Vec<GanttRow> = solution
        .task_schedules
        .values()
        .map(|ts| GanttRow {
            task_id: ts.task_id,
            machine_id: ts.machine_id,
            start_time: ts.start_time,
            completion_time: ts.completion_time,
        })
        .collect();
    rows.sort_by(|a, b| {
        a.machine_id
            .cmp(&b.machine_id)
            .then(a.start_time.partial_cmp(&b.start_time).unwrap_or(std::cmp::Ordering::Equal))
    });
    rows
}

/// Builds a per-machine timeline with utilization, sorted by `machine_id`.
pub fn machine_timelines(solution: &Solution) -> Vec<MachineTimeline> {
    let makespan = solution.makespan;
    let mut timelines: Vec<MachineTimeline> = solution
        .machine_schedules
        .values()
        .map(|ms| {
            let busy_time: f64 = ms
                .task_ids
                .iter()
                .filter_map(|id| solution.task_schedules.get(id))
                .map(|ts| ts.completion_time - ts.start_time)
                .sum();
            let utilization = if makespan.is_finite() && makespan > 0.0 {
                (busy_time / makespan).clamp(0.0, 1.0)
            } else {
                0.0
            };
            MachineTimeline {
                machine_id: ms.machine_id,
                task_ids: ms.task_ids.clone(),
                utilization,
            }
        })
        .collect();
    timelines.sort_by_key(|t| t.machine_id);
    timelines
}

/// Re-exposes `solution.fitness_history` as `(iteration, fitness)` pairs.
pub fn fitness_series(solution: &Solution) -> Vec<FitnessPoint> {
    solution
        .fitness_history
        .iter()
        .enumerate()
        .map(|(iteration, &fitness)| FitnessPoint { iteration, fitness })
        .collect()
}

/// Builds a per-machine load summary from the instance and schedule,
/// sorted by `machine_id`. Used by the out-of-scope result-analysis report
/// as raw input to a quality score this crate never computes.
pub fn machine_load_summary(instance: &ProblemInstance, solution: &Solution) -> Vec<MachineLoad> {
    instance
        .machines_sorted()
        .into_iter()
        .map(|machine| {
            let task_ids = solution
                .machine_schedules
                .get(&machine.id)
                .map(|ms| ms.task_ids.as_slice())
                .unwrap_or(&[]);
            let total_computation_assigned: f64 = task_ids
                .iter()
                .filter_map(|id| instance.task(*id))
                .map(|t| t.computation_volume)
                .sum();
            MachineLoad {
                machine_id: machine.id,
                total_computation_assigned,
                task_count: task_ids.len(),
            }
        })
        .collect()
}

/// Builds the complete [`VisualizationData`] bundle for a solution.
pub fn build(instance: &ProblemInstance, solution: &Solution) -> VisualizationData {
    VisualizationData {
        gantt_rows: gantt_rows(solution),
        machine_timelines: machine_timelines(solution),
        fitness_series: fitness_series(solution),
        machine_loads: machine_load_summary(instance, solution),
    }
}
