//! Particle swarm search driver.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::candidate;
use crate::error::Result;
use crate::models::{Assignment, ProblemInstance, Solution, TaskId};
use crate::orchestrator::SearchDriver;
use crate::scheduler;

use super::config::PsoConfig;
use super::particle::Particle;

struct GlobalBest {
    position: Assignment,
    fitness: f64,
    solution: Option<Solution>,
}

/// Discrete particle swarm optimizer over task-to-machine assignments.
///
/// Each particle's "velocity" per task is a probability of jumping to a
/// different machine; position updates redraw a machine id when a coin flip
/// at that probability succeeds.
pub struct PsoDriver {
    config: PsoConfig,
    particles: Vec<Particle>,
    global_best: Arc<Mutex<GlobalBest>>,
    seed: u64,
    iteration: usize,
    no_improvement: usize,
    fitness_history: Vec<f64>,
    average_history: Vec<f64>,
    cancelled: Arc<AtomicBool>,
}

/// Deterministically derives a per-worker seed from the driver seed, the
/// iteration index, and the candidate index, so parallel workers never share
/// an RNG yet a full run stays reproducible for a fixed driver seed.
fn derive_worker_seed(driver_seed: u64, iteration: usize, candidate_index: usize) -> u64 {
    driver_seed
        .wrapping_mul(0x9E3779B97F4A7C15)
        .wrapping_add((iteration as u64).wrapping_mul(0xBF58476D1CE4E5B9))
        .wrapping_add((candidate_index as u64).wrapping_mul(0x94D049BB133111EB))
}

impl PsoDriver {
    /// Builds and evaluates the initial swarm for `instance`.
    pub fn new(instance: &ProblemInstance, config: PsoConfig) -> Self {
        let seed = config.random_seed.unwrap_or_else(rand::random);
        let mut rng = SmallRng::seed_from_u64(seed);

        let task_ids = instance.task_ids();
        let particles: Vec<Particle> = (0..config.swarm_size)
            .map(|_| {
                let mut position = candidate::random_assignment(instance, &mut rng);
                candidate::repair(instance, &mut position, &mut rng);
                let velocity: HashMap<TaskId, f64> = task_ids
                    .iter()
                    .map(|&id| (id, rng.gen_range(0.0..=1.0)))
                    .collect();
                Particle::new(position, velocity)
            })
            .collect();

        let initial_position = particles
            .first()
            .map(|p| p.position.clone())
            .unwrap_or_default();

        log::info!(
            "pso: initialized swarm of {} particles over {} tasks",
            config.swarm_size,
            task_ids.len()
        );

        Self {
            config,
            particles,
            global_best: Arc::new(Mutex::new(GlobalBest {
                position: initial_position,
                fitness: f64::INFINITY,
                solution: None,
            })),
            seed,
            iteration: 0,
            no_improvement: 0,
            fitness_history: Vec::new(),
            average_history: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    fn run_iteration(&mut self, instance: &ProblemInstance) {
        let assignments: Vec<Assignment> =
            self.particles.iter().map(|p| p.position.clone()).collect();
        let solutions = scheduler::schedule_all(instance, &assignments);

        // Personal-best update, then global-best under lock — ordering
        // required by the concurrency contract (global-best only reflects a
        // particle's own already-updated personal best).
        let global_best = Arc::clone(&self.global_best);
        let found_at_iteration = self.iteration + 1;
        self.particles
            .par_iter_mut()
            .zip(solutions.par_iter())
            .for_each(|(particle, solution)| {
                particle.current_solution = Some(solution.clone());
                let fitness = solution.fitness();
                if fitness < particle.best_fitness {
                    let mut stamped = solution.clone();
                    stamped.iteration_found = found_at_iteration;
                    particle.best_fitness = fitness;
                    particle.best_position = particle.position.clone();
                    particle.best_solution = Some(stamped.clone());

                    let mut global = global_best.lock();
                    if fitness < global.fitness {
                        global.fitness = fitness;
                        global.position = particle.position.clone();
                        global.solution = Some(stamped);
                    }
                }
            });

        let average_fitness = {
            let sum: f64 = solutions
                .iter()
                .map(|s| s.fitness())
                .filter(|f| f.is_finite())
                .sum();
            let finite_count = solutions.iter().filter(|s| s.fitness().is_finite()).count();
            if finite_count == 0 {
                f64::INFINITY
            } else {
                sum / finite_count as f64
            }
        };

        let global_fitness_before = self
            .fitness_history
            .last()
            .copied()
            .unwrap_or(f64::INFINITY);

        // Velocity and position update, independent per particle.
        let config = &self.config;
        let instance_ref = instance;
        let global_snapshot = {
            let global = self.global_best.lock();
            global.position.clone()
        };
        let driver_seed = self.seed;
        let iteration = self.iteration;
        self.particles
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, particle)| {
                let mut worker_rng =
                    SmallRng::seed_from_u64(derive_worker_seed(driver_seed, iteration, index));
                let worker_rng = &mut worker_rng;
                let task_ids = instance_ref.task_ids();
                let mut new_velocity = HashMap::with_capacity(task_ids.len());
                for &task_id in &task_ids {
                    let v = *particle.velocity.get(&task_id).unwrap_or(&0.0);
                    let cognitive = if particle.best_position.get(&task_id)
                        != particle.position.get(&task_id)
                    {
                        1.0
                    } else {
                        0.0
                    };
                    let social = if global_snapshot.get(&task_id) != particle.position.get(&task_id)
                    {
                        1.0
                    } else {
                        0.0
                    };
                    let r1: f64 = worker_rng.gen_range(0.0..=1.0);
                    let r2: f64 = worker_rng.gen_range(0.0..=1.0);
                    let updated = config.inertia_weight * v
                        + config.cognitive_weight * r1 * cognitive
                        + config.social_weight * r2 * social;
                    new_velocity.insert(task_id, updated.clamp(0.0, 1.0));
                }

                for &task_id in &task_ids {
                    let probability = new_velocity[&task_id];
                    if worker_rng.gen_range(0.0..=1.0) < probability {
                        let current = particle.position.get(&task_id).copied();
                        if let Some(new_machine) = candidate::reassign_to_different_machine(
                            instance_ref,
                            current,
                            worker_rng,
                        ) {
                            particle.position.insert(task_id, new_machine);
                        }
                    }
                }
                particle.velocity = new_velocity;
                candidate::repair(instance_ref, &mut particle.position, worker_rng);
            },
        );

        let global_fitness_after = self.global_best.lock().fitness;
        self.fitness_history.push(global_fitness_after);
        self.average_history.push(average_fitness);
        if global_fitness_after < global_fitness_before {
            self.no_improvement = 0;
        } else {
            self.no_improvement += 1;
        }
        self.iteration += 1;

        log::debug!(
            "pso: iteration {} best_fitness={} average_fitness={}",
            self.iteration,
            global_fitness_after,
            average_fitness
        );
    }
}

impl SearchDriver for PsoDriver {
    fn step(&mut self, instance: &ProblemInstance) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        self.run_iteration(instance);
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.iteration >= self.config.max_iterations
            || self.no_improvement >= self.config.no_improvement_limit
    }

    fn best_solution(&self) -> Option<Solution> {
        let mut solution = self.global_best.lock().solution.clone()?;
        solution.fitness_history = self.fitness_history.clone();
        Some(solution)
    }

    fn fitness_history(&self) -> &[f64] {
        &self.fitness_history
    }

    fn average_fitness(&self) -> Option<f64> {
        self.average_history.last().copied()
    }

    fn iterations_completed(&self) -> usize {
        self.iteration
    }

    fn stop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, VirtualMachine};

    fn small_instance() -> ProblemInstance {
        ProblemInstance::new(
            vec![
                Task::new(1, 10.0, 1.0),
                Task::new(2, 10.0, 1.0).with_predecessor(1),
            ],
            vec![
                VirtualMachine::new(1, 10.0, 10.0),
                VirtualMachine::new(2, 5.0, 10.0),
            ],
        )
    }

    #[test]
    fn p6_best_fitness_non_increasing() {
        let instance = small_instance();
        let config = PsoConfig::default()
            .with_swarm_size(8)
            .with_max_iterations(10)
            .with_seed(42);
        let mut driver = PsoDriver::new(&instance, config);
        for _ in 0..10 {
            driver.step(&instance).unwrap();
        }
        let history = driver.fitness_history();
        for window in history.windows(2) {
            assert!(window[1] <= window[0]);
        }
    }

    #[test]
    fn best_solution_carries_the_driver_fitness_history() {
        let instance = small_instance();
        let config = PsoConfig::default()
            .with_swarm_size(6)
            .with_max_iterations(5)
            .with_seed(7);
        let mut driver = PsoDriver::new(&instance, config);
        for _ in 0..5 {
            driver.step(&instance).unwrap();
        }
        let solution = SearchDriver::best_solution(&driver).unwrap();
        assert_eq!(solution.fitness_history, driver.fitness_history());
        assert!(!solution.fitness_history.is_empty());
    }

    #[test]
    fn p7_terminates_within_max_iterations() {
        let instance = small_instance();
        let config = PsoConfig::default()
            .with_swarm_size(5)
            .with_max_iterations(5)
            .with_seed(1);
        let mut driver = PsoDriver::new(&instance, config);
        let mut steps = 0;
        while !driver.is_complete() && steps < 100 {
            driver.step(&instance).unwrap();
            steps += 1;
        }
        assert!(steps <= 5);
        assert!(driver.is_complete());
    }

    #[test]
    fn p8_reproducible_with_same_seed() {
        let instance = small_instance();
        let make = || {
            let config = PsoConfig::default()
                .with_swarm_size(6)
                .with_max_iterations(6)
                .with_seed(99);
            let mut driver = PsoDriver::new(&instance, config);
            for _ in 0..6 {
                driver.step(&instance).unwrap();
            }
            driver.fitness_history().to_vec()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn stop_marks_complete() {
        let instance = small_instance();
        let config = PsoConfig::default().with_swarm_size(4).with_seed(3);
        let mut driver = PsoDriver::new(&instance, config);
        driver.stop();
        assert!(driver.is_complete());
    }

    #[test]
    fn best_solution_populates_after_step() {
        let instance = small_instance();
        let config = PsoConfig::default().with_swarm_size(4).with_seed(5);
        let mut driver = PsoDriver::new(&instance, config);
        driver.step(&instance).unwrap();
        assert!(SearchDriver::best_solution(&driver).is_some());
    }

    #[test]
    fn best_solution_records_the_iteration_it_was_found_at() {
        let instance = small_instance();
        let config = PsoConfig::default()
            .with_swarm_size(6)
            .with_max_iterations(5)
            .with_seed(11);
        let mut driver = PsoDriver::new(&instance, config);
        driver.step(&instance).unwrap();
        let first = SearchDriver::best_solution(&driver).unwrap();
        assert_eq!(first.iteration_found, 1);

        driver.step(&instance).unwrap();
        let second = SearchDriver::best_solution(&driver).unwrap();
        assert!(second.iteration_found >= 1 && second.iteration_found <= 2);
    }

    #[test]
    fn s6_finds_feasible_solution_on_random_instance() {
        use crate::generation::{self, GenerationConfig};

        let instance = generation::initialize_random_instance(
            20,
            4,
            Some(2024),
            &GenerationConfig::default(),
        );
        let config = PsoConfig::default().with_seed(2024);
        let mut driver = PsoDriver::new(&instance, config);
        while !driver.is_complete() {
            driver.step(&instance).unwrap();
        }
        let solution = SearchDriver::best_solution(&driver).expect("a run always finds a solution");
        assert!(solution.is_feasible());
        assert_eq!(solution.total_penalty, 0.0);
    }
}
