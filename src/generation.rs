//! Synthetic random problem instances.
//!
//! Produces a [`ProblemInstance`] for benchmarking and for the orchestrator's
//! `initialize_random_instance` entry point. Task `i` (1-indexed) draws its
//! attributes uniformly from the configured ranges and picks its
//! predecessors only from tasks `1..i`, which guarantees the resulting
//! precedence graph is acyclic by construction — no separate DAG repair is
//! needed after generation.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::models::{ProblemInstance, Task, VirtualMachine};

/// Ranges used to draw task and machine attributes for a random instance.
///
/// # Example
///
/// ```
/// use vm_task_scheduler::generation::GenerationConfig;
///
/// let config = GenerationConfig::default();
/// assert_eq!(config.max_predecessors, 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// Inclusive range for each task's computation volume.
    pub computation_volume_range: (f64, f64),
    /// Inclusive range for each task's memory requirement.
    pub memory_requirement_range: (f64, f64),
    /// Upper bound on how many predecessors a task may be given.
    pub max_predecessors: usize,
    /// Inclusive range for each machine's performance.
    pub machine_performance_range: (f64, f64),
    /// Inclusive range for each machine's available memory.
    pub machine_memory_range: (f64, f64),
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            computation_volume_range: (10.0, 100.0),
            memory_requirement_range: (1.0, 20.0),
            max_predecessors: 3,
            machine_performance_range: (5.0, 25.0),
            machine_memory_range: (10.0, 30.0),
        }
    }
}

/// Draws a uniformly random value in `[low, high]`, tolerating `low == high`.
fn uniform(rng: &mut impl Rng, (low, high): (f64, f64)) -> f64 {
    if low >= high {
        low
    } else {
        rng.gen_range(low..=high)
    }
}

/// Generates a random [`ProblemInstance`] with `task_count` tasks and
/// `machine_count` machines.
///
/// Task `i` (1-indexed) draws a predecessor count in
/// `[0, min(max_predecessors, i - 1)]` and that many distinct predecessor
/// ids uniformly from `[1, i - 1]`; since predecessors are always drawn
/// from strictly lower ids, the resulting graph is acyclic without further
/// checking.
pub fn initialize_random_instance(
    task_count: usize,
    machine_count: usize,
    seed: Option<u64>,
    config: &GenerationConfig,
) -> ProblemInstance {
    let seed = seed.unwrap_or_else(rand::random);
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut tasks = Vec::with_capacity(task_count);
    for i in 1..=task_count as u64 {
        let computation_volume = uniform(&mut rng, config.computation_volume_range);
        let memory_requirement = uniform(&mut rng, config.memory_requirement_range);
        let mut task = Task::new(i, computation_volume, memory_requirement);

        let max_preds = config.max_predecessors.min((i - 1) as usize);
        if max_preds > 0 {
            let predecessor_count = rng.gen_range(0..=max_preds);
            let mut chosen = std::collections::BTreeSet::new();
            // Duplicates are simply discarded by the set, so the drawn count
            // is an upper bound, not a guarantee, matching the spec.
            for _ in 0..predecessor_count {
                let candidate = rng.gen_range(1..i);
                chosen.insert(candidate);
            }
            task = task.with_predecessors(chosen);
        }
        tasks.push(task);
    }

    let mut machines = Vec::with_capacity(machine_count);
    for i in 1..=machine_count as u64 {
        let performance = uniform(&mut rng, config.machine_performance_range);
        let available_memory = uniform(&mut rng, config.machine_memory_range);
        machines.push(VirtualMachine::new(i, performance, available_memory));
    }

    log::info!(
        "generation: built random instance with {} tasks, {} machines (seed={})",
        task_count,
        machine_count,
        seed
    );

    ProblemInstance::new(tasks, machines)
}
