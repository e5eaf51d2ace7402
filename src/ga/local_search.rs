//! Optional GA local search: single-task machine reassignment hill-climbing.

use crate::models::{Assignment, ProblemInstance, Solution};
use crate::scheduler;

/// Hill-climbs from `assignment` by trying every alternative machine for
/// each task in turn, keeping the first strict improvement found and
/// restarting the sweep from the beginning of the task list. Stops when a
/// full sweep produces no improvement, or after `max_sweeps` sweeps.
///
/// Returns the best solution found, which is at least as good as
/// `schedule(instance, assignment)`.
pub fn local_search(
    instance: &ProblemInstance,
    assignment: &Assignment,
    max_sweeps: usize,
) -> Solution {
    let mut current = assignment.clone();
    let mut best = scheduler::schedule(instance, &current);

    let task_ids = instance.task_ids();
    let machine_ids = instance.machine_ids();

    for _ in 0..max_sweeps {
        let mut improved = false;
        'sweep: for &task_id in &task_ids {
            let original_machine = current.get(&task_id).copied();
            for &machine_id in &machine_ids {
                if Some(machine_id) == original_machine {
                    continue;
                }
                let mut candidate_assignment = current.clone();
                candidate_assignment.insert(task_id, machine_id);
                let candidate_solution = scheduler::schedule(instance, &candidate_assignment);
                if candidate_solution.fitness() < best.fitness() {
                    current = candidate_assignment;
                    best = candidate_solution;
                    improved = true;
                    break 'sweep;
                }
            }
        }
        if !improved {
            break;
        }
    }

    best
}
