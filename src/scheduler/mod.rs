//! List scheduler — the fitness oracle for the optimization engine.
//!
//! Given a [`ProblemInstance`] and an [`Assignment`], deterministically
//! computes a feasible schedule (or a penalty for an infeasible one). The
//! scheduler never mutates the canonical instance: all scratch state is a
//! private, per-evaluation copy.
//!
//! # Algorithm
//!
//! 1. **Penalty pre-pass**: for each task, check the assigned machine has
//!    enough memory. Any shortfall is a hard violation; the makespan is not
//!    computed and is reported as `+inf`.
//! 2. **List scheduling main pass** (only when no hard violation): tasks
//!    become "ready" once every predecessor has completed. Ready tasks are
//!    processed in ascending task-id order, each starting no earlier than
//!    its assigned machine is free and every predecessor has finished.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 4

use std::collections::{BTreeSet, HashMap};
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use rayon::prelude::*;

use crate::models::{
    Assignment, MachineId, MachineSchedule, ProblemInstance, Solution, TaskId, TaskSchedule,
};

/// Penalty charged for a structurally broken candidate (missing machine
/// reference, or a task left unassigned). Deliberately far larger than any
/// ordinary memory-shortfall penalty so repair always dominates it.
fn structural_violation_penalty(instance: &ProblemInstance) -> f64 {
    instance.memory_penalty_coefficient.max(1.0) * 1.0e6
}

/// Evaluates a single assignment against an instance, producing a complete
/// [`Solution`]. Never mutates `instance`.
pub fn schedule(instance: &ProblemInstance, assignment: &Assignment) -> Solution {
    let started = Instant::now();
    let mut total_penalty = 0.0_f64;
    let mut hard_violation = false;

    for task in instance.tasks_sorted() {
        match assignment.get(&task.id) {
            None => {
                hard_violation = true;
                total_penalty += structural_violation_penalty(instance);
            }
            Some(machine_id) => match instance.machine(*machine_id) {
                None => {
                    hard_violation = true;
                    total_penalty += structural_violation_penalty(instance);
                }
                Some(machine) => {
                    if task.memory_requirement > machine.available_memory {
                        hard_violation = true;
                        total_penalty += (task.memory_requirement - machine.available_memory)
                            * instance.memory_penalty_coefficient;
                    }
                }
            },
        }
    }

    if hard_violation {
        return Solution {
            assignment: assignment.clone(),
            makespan: f64::INFINITY,
            total_penalty,
            fitness_history: Vec::new(),
            computation_time: started.elapsed(),
            iteration_found: 0,
            task_schedules: HashMap::new(),
            machine_schedules: HashMap::new(),
        };
    }

    run_list_scheduling(instance, assignment, total_penalty, started)
}

/// Main list-scheduling pass, assuming every task has a feasible machine.
fn run_list_scheduling(
    instance: &ProblemInstance,
    assignment: &Assignment,
    total_penalty: f64,
    started: Instant,
) -> Solution {
    struct MachineScratch {
        last_completion_time: f64,
        assigned_tasks: Vec<TaskId>,
    }

    let mut machines: HashMap<MachineId, MachineScratch> = instance
        .machines_sorted()
        .into_iter()
        .map(|m| {
            (
                m.id,
                MachineScratch {
                    last_completion_time: 0.0,
                    assigned_tasks: Vec::new(),
                },
            )
        })
        .collect();

    let mut completed: HashMap<TaskId, f64> = HashMap::new();
    let mut remaining: BTreeSet<TaskId> = instance.task_ids().into_iter().collect();
    let mut task_schedules: HashMap<TaskId, TaskSchedule> = HashMap::new();
    let mut max_completion = 0.0_f64;

    while !remaining.is_empty() {
        let ready: Vec<TaskId> = remaining
            .iter()
            .copied()
            .filter(|id| {
                instance
                    .task(*id)
                    .map(|t| t.predecessor_ids.iter().all(|p| completed.contains_key(p)))
                    .unwrap_or(false)
            })
            .collect();

        if ready.is_empty() {
            // Should not occur for a validated DAG; guards against an
            // unvalidated instance slipping through with a stray cycle.
            break;
        }

        for task_id in ready {
            let task = match instance.task(task_id) {
                Some(t) => t,
                None => continue,
            };
            let machine_id = assignment[&task_id];
            let machine = machines.get_mut(&machine_id).expect("validated above");

            let pred_ready = task
                .predecessor_ids
                .iter()
                .map(|p| completed[p])
                .fold(0.0_f64, f64::max);
            let start_time = machine.last_completion_time.max(pred_ready);
            let instance_machine = instance.machine(machine_id).expect("validated above");
            let execution_time = instance_machine.execution_time(task.computation_volume);
            let completion_time = start_time + execution_time;

            machine.last_completion_time = completion_time;
            machine.assigned_tasks.push(task_id);
            completed.insert(task_id, completion_time);
            remaining.remove(&task_id);

            task_schedules.insert(
                task_id,
                TaskSchedule {
                    task_id,
                    machine_id,
                    start_time,
                    completion_time,
                },
            );
            max_completion = max_completion.max(completion_time);
        }
    }

    let machine_schedules: HashMap<MachineId, MachineSchedule> = machines
        .into_iter()
        .map(|(id, scratch)| {
            (
                id,
                MachineSchedule {
                    machine_id: id,
                    task_ids: scratch.assigned_tasks,
                    last_completion_time: scratch.last_completion_time,
                },
            )
        })
        .collect();

    Solution {
        assignment: assignment.clone(),
        makespan: max_completion,
        total_penalty,
        fitness_history: Vec::new(),
        computation_time: started.elapsed(),
        iteration_found: 0,
        task_schedules,
        machine_schedules,
    }
}

/// Evaluates a batch of assignments in parallel. Each evaluation owns its
/// own scratch state; there is no cross-evaluation aliasing. The returned
/// vector's order matches `assignments`.
///
/// A panic while scheduling a single candidate is caught and converted into
/// an infeasible sentinel solution (`fitness = +inf`) so one bad candidate
/// cannot poison the rest of the batch.
pub fn schedule_all(instance: &ProblemInstance, assignments: &[Assignment]) -> Vec<Solution> {
    assignments
        .par_iter()
        .map(|assignment| {
            std::panic::catch_unwind(AssertUnwindSafe(|| schedule(instance, assignment)))
                .unwrap_or_else(|_| {
                    log::warn!("scheduler evaluation panicked; substituting infeasible sentinel");
                    Solution::infeasible_sentinel(assignment.clone())
                })
        })
        .collect()
}
