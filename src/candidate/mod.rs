//! Candidate assignment generation and repair.
//!
//! A "candidate" in both drivers is just an [`Assignment`]; this module
//! holds the pieces shared by PSO and GA: drawing a uniformly random
//! assignment, and repairing one so that every task that *can* be hosted
//! feasibly *is*.

use rand::Rng;

use crate::models::{Assignment, ProblemInstance};

/// Draws a uniformly random assignment: every task gets a uniformly random
/// machine id from the instance.
pub fn random_assignment(instance: &ProblemInstance, rng: &mut impl Rng) -> Assignment {
    let machine_ids = instance.machine_ids();
    instance
        .task_ids()
        .into_iter()
        .map(|task_id| {
            let machine_id = machine_ids[rng.gen_range(0..machine_ids.len())];
            (task_id, machine_id)
        })
        .collect()
}

/// Repairs an assignment in place: every task whose assigned machine lacks
/// sufficient memory is reassigned to a uniformly random machine drawn from
/// the set of machines that can host it. A task with no feasible machine is
/// left unchanged — the scheduler's penalty pass will reflect the
/// violation.
pub fn repair(instance: &ProblemInstance, assignment: &mut Assignment, rng: &mut impl Rng) {
    for task_id in instance.task_ids() {
        let task = match instance.task(task_id) {
            Some(t) => t,
            None => continue,
        };
        let current_machine_id = assignment.get(&task_id).copied();
        let currently_feasible = current_machine_id
            .and_then(|mid| instance.machine(mid))
            .map(|m| m.can_host(task.memory_requirement))
            .unwrap_or(false);
        if currently_feasible {
            continue;
        }

        let feasible: Vec<_> = instance
            .machines_sorted()
            .into_iter()
            .filter(|m| m.can_host(task.memory_requirement))
            .map(|m| m.id)
            .collect();
        if !feasible.is_empty() {
            let machine_id = feasible[rng.gen_range(0..feasible.len())];
            assignment.insert(task_id, machine_id);
        }
    }
}

/// Replaces `assignment[task_id]` with a uniformly random machine id
/// different from its current one, if more than one machine exists.
/// Used by both mutation (GA) and position update (PSO).
pub fn reassign_to_different_machine(
    instance: &ProblemInstance,
    current: Option<u64>,
    rng: &mut impl Rng,
) -> Option<u64> {
    let machine_ids = instance.machine_ids();
    if machine_ids.len() <= 1 {
        return current.or_else(|| machine_ids.first().copied());
    }
    loop {
        let candidate = machine_ids[rng.gen_range(0..machine_ids.len())];
        if Some(candidate) != current {
            return Some(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, VirtualMachine};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn instance() -> ProblemInstance {
        ProblemInstance::new(
            vec![Task::new(1, 10.0, 15.0), Task::new(2, 10.0, 2.0)],
            vec![
                VirtualMachine::new(1, 10.0, 5.0),
                VirtualMachine::new(2, 10.0, 20.0),
            ],
        )
    }

    #[test]
    fn p9_repair_invariant() {
        let instance = instance();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut assignment: Assignment = [(1, 1), (2, 1)].into_iter().collect();
        repair(&instance, &mut assignment, &mut rng);
        // Task 1 needs 15.0, only machine 2 can host it.
        assert_eq!(assignment[&1], 2);
    }

    #[test]
    fn repair_leaves_infeasible_task_unchanged_when_no_host_exists() {
        let instance = ProblemInstance::new(
            vec![Task::new(1, 10.0, 100.0)],
            vec![VirtualMachine::new(1, 10.0, 5.0)],
        );
        let mut rng = SmallRng::seed_from_u64(1);
        let mut assignment: Assignment = [(1, 1)].into_iter().collect();
        repair(&instance, &mut assignment, &mut rng);
        assert_eq!(assignment[&1], 1);
    }

    #[test]
    fn random_assignment_covers_every_task() {
        let instance = instance();
        let mut rng = SmallRng::seed_from_u64(7);
        let assignment = random_assignment(&instance, &mut rng);
        assert_eq!(assignment.len(), instance.task_count());
        for task_id in instance.task_ids() {
            assert!(assignment.contains_key(&task_id));
        }
    }

    #[test]
    fn reassign_skips_current_machine_when_alternatives_exist() {
        let instance = instance();
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..20 {
            let next = reassign_to_different_machine(&instance, Some(1), &mut rng);
            assert_ne!(next, Some(1));
        }
    }

    #[test]
    fn reassign_single_machine_returns_it() {
        let instance = ProblemInstance::new(
            vec![Task::new(1, 10.0, 1.0)],
            vec![VirtualMachine::new(1, 10.0, 10.0)],
        );
        let mut rng = SmallRng::seed_from_u64(3);
        let next = reassign_to_different_machine(&instance, Some(1), &mut rng);
        assert_eq!(next, Some(1));
    }
}
