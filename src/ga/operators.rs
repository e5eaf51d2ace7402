//! Selection, crossover, and mutation operators over task assignments.

use rand::Rng;

use crate::candidate;
use crate::models::{Assignment, ProblemInstance, TaskId};

use super::individual::Individual;

/// Tournament selection: sample `tournament_size` individuals with
/// replacement and return the index of the one with lowest fitness, ties
/// broken by whichever was sampled first.
pub fn tournament_select(
    population: &[Individual],
    tournament_size: usize,
    rng: &mut impl Rng,
) -> usize {
    let mut best_index = rng.gen_range(0..population.len());
    let mut best_fitness = population[best_index].fitness();
    for _ in 1..tournament_size {
        let candidate_index = rng.gen_range(0..population.len());
        let candidate_fitness = population[candidate_index].fitness();
        if candidate_fitness < best_fitness {
            best_fitness = candidate_fitness;
            best_index = candidate_index;
        }
    }
    best_index
}

/// Single-point crossover over task ids in ascending order. With probability
/// `crossover_rate`, splits both parents at the same random cut point and
/// swaps tails; otherwise the children are plain clones of the parents.
pub fn crossover(
    parent1: &Assignment,
    parent2: &Assignment,
    task_ids: &[TaskId],
    crossover_rate: f64,
    rng: &mut impl Rng,
) -> (Assignment, Assignment) {
    if task_ids.len() < 2 || rng.gen_range(0.0..=1.0) >= crossover_rate {
        return (parent1.clone(), parent2.clone());
    }

    let cut = rng.gen_range(1..task_ids.len());
    let mut child1 = Assignment::new();
    let mut child2 = Assignment::new();
    for (index, &task_id) in task_ids.iter().enumerate() {
        if index < cut {
            child1.insert(task_id, parent1[&task_id]);
            child2.insert(task_id, parent2[&task_id]);
        } else {
            child1.insert(task_id, parent2[&task_id]);
            child2.insert(task_id, parent1[&task_id]);
        }
    }
    (child1, child2)
}

/// Mutates a single chromosome in place: for each task id, with probability
/// `mutation_rate`, replaces its machine id with a uniformly random one
/// different from the current one.
pub fn mutate(
    chromosome: &mut Assignment,
    instance: &ProblemInstance,
    mutation_rate: f64,
    rng: &mut impl Rng,
) {
    let task_ids = instance.task_ids();
    for task_id in task_ids {
        if rng.gen_range(0.0..=1.0) < mutation_rate {
            let current = chromosome.get(&task_id).copied();
            if let Some(new_machine) =
                candidate::reassign_to_different_machine(instance, current, rng)
            {
                chromosome.insert(task_id, new_machine);
            }
        }
    }
}
