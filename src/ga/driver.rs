//! Genetic algorithm search driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::candidate;
use crate::error::Result;
use crate::models::{Assignment, ProblemInstance, Solution};
use crate::orchestrator::SearchDriver;
use crate::scheduler;

use super::config::GaConfig;
use super::individual::Individual;
use super::operators::{crossover, mutate, tournament_select};

/// Generational genetic algorithm over task-to-machine assignments.
pub struct GaDriver {
    config: GaConfig,
    population: Vec<Individual>,
    rng: SmallRng,
    generation: usize,
    no_improvement: usize,
    best_solution: Option<Solution>,
    best_fitness: f64,
    fitness_history: Vec<f64>,
    average_history: Vec<f64>,
    cancelled: Arc<AtomicBool>,
}

impl GaDriver {
    /// Builds and evaluates the initial population for `instance`.
    pub fn new(instance: &ProblemInstance, config: GaConfig) -> Self {
        let seed = config.random_seed.unwrap_or_else(rand::random);
        let mut rng = SmallRng::seed_from_u64(seed);

        let population: Vec<Individual> = (0..config.population_size)
            .map(|_| {
                let mut chromosome = candidate::random_assignment(instance, &mut rng);
                candidate::repair(instance, &mut chromosome, &mut rng);
                Individual::new(chromosome)
            })
            .collect();

        log::info!(
            "ga: initialized population of {} individuals over {} tasks",
            config.population_size,
            instance.task_count()
        );

        let mut driver = Self {
            config,
            population,
            rng,
            generation: 0,
            no_improvement: 0,
            best_solution: None,
            best_fitness: f64::INFINITY,
            fitness_history: Vec::new(),
            average_history: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        driver.evaluate_population(instance);
        driver
    }

    fn evaluate_population(&mut self, instance: &ProblemInstance) {
        let assignments: Vec<Assignment> = self
            .population
            .iter()
            .map(|ind| ind.chromosome.clone())
            .collect();
        let solutions = scheduler::schedule_all(instance, &assignments);
        for (individual, solution) in self.population.iter_mut().zip(solutions.into_iter()) {
            individual.solution = Some(solution);
        }
    }

    fn record_generation_stats(&mut self) {
        let fitnesses: Vec<f64> = self.population.iter().map(|ind| ind.fitness()).collect();
        let generation_best = fitnesses.iter().copied().fold(f64::INFINITY, f64::min);
        let finite: Vec<f64> = fitnesses.iter().copied().filter(|f| f.is_finite()).collect();
        let average = if finite.is_empty() {
            f64::INFINITY
        } else {
            finite.iter().sum::<f64>() / finite.len() as f64
        };

        if generation_best < self.best_fitness {
            self.best_fitness = generation_best;
            self.best_solution = self
                .population
                .iter()
                .filter(|ind| ind.fitness() == generation_best)
                .find_map(|ind| ind.solution.clone())
                .map(|mut solution| {
                    solution.iteration_found = self.generation + 1;
                    solution
                });
            self.no_improvement = 0;
        } else {
            self.no_improvement += 1;
        }

        self.fitness_history.push(self.best_fitness);
        self.average_history.push(average);
        log::debug!(
            "ga: generation {} best_fitness={} average_fitness={}",
            self.generation,
            self.best_fitness,
            average
        );
    }

    fn build_next_generation(&mut self, instance: &ProblemInstance) {
        let task_ids = instance.task_ids();
        let elite_count = self.config.elite_count().min(self.population.len());

        let mut ranked: Vec<usize> = (0..self.population.len()).collect();
        ranked.sort_by(|&a, &b| {
            self.population[a]
                .fitness()
                .partial_cmp(&self.population[b].fitness())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut next_generation: Vec<Individual> = ranked[..elite_count]
            .iter()
            .map(|&i| self.population[i].clone())
            .collect();
        let elite_reserved = next_generation.len();

        while next_generation.len() < self.config.population_size {
            let i1 = tournament_select(&self.population, self.config.tournament_size, &mut self.rng);
            let i2 = tournament_select(&self.population, self.config.tournament_size, &mut self.rng);
            let (mut child1, mut child2) = crossover(
                &self.population[i1].chromosome,
                &self.population[i2].chromosome,
                &task_ids,
                self.config.crossover_rate,
                &mut self.rng,
            );
            mutate(&mut child1, instance, self.config.mutation_rate, &mut self.rng);
            mutate(&mut child2, instance, self.config.mutation_rate, &mut self.rng);
            candidate::repair(instance, &mut child1, &mut self.rng);
            candidate::repair(instance, &mut child2, &mut self.rng);

            next_generation.push(Individual::new(child1));
            if next_generation.len() < self.config.population_size {
                next_generation.push(Individual::new(child2));
            }
        }

        for individual in next_generation.iter_mut() {
            individual.age += 1;
        }

        if self.config.max_age > 0 {
            let max_age = self.config.max_age;
            let mut index = 0;
            next_generation.retain(|individual| {
                let keep = index < elite_reserved || individual.age <= max_age;
                index += 1;
                keep
            });
            next_generation.truncate(self.config.population_size);
        }

        self.population = next_generation;
    }
}

impl SearchDriver for GaDriver {
    fn step(&mut self, instance: &ProblemInstance) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        if self.generation > 0 {
            self.evaluate_population(instance);
        }
        self.record_generation_stats();
        self.build_next_generation(instance);
        self.generation += 1;
        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
            || self.generation >= self.config.max_generations
            || self.no_improvement >= self.config.no_improvement_limit
    }

    fn best_solution(&self) -> Option<Solution> {
        let mut solution = self.best_solution.clone()?;
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
        self.generation
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
                Task::new(3, 10.0, 1.0).with_predecessor(1),
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
        let config = GaConfig::default()
            .with_population_size(10)
            .with_max_generations(10)
            .with_seed(42);
        let mut driver = GaDriver::new(&instance, config);
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
        let config = GaConfig::default()
            .with_population_size(8)
            .with_max_generations(5)
            .with_seed(7);
        let mut driver = GaDriver::new(&instance, config);
        for _ in 0..5 {
            driver.step(&instance).unwrap();
        }
        let solution = driver.best_solution().unwrap();
        assert_eq!(solution.fitness_history, driver.fitness_history());
        assert!(!solution.fitness_history.is_empty());
    }

    #[test]
    fn p7_terminates_within_max_generations() {
        let instance = small_instance();
        let config = GaConfig::default()
            .with_population_size(8)
            .with_max_generations(5)
            .with_seed(1);
        let mut driver = GaDriver::new(&instance, config);
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
            let config = GaConfig::default()
                .with_population_size(8)
                .with_max_generations(6)
                .with_seed(99);
            let mut driver = GaDriver::new(&instance, config);
            for _ in 0..6 {
                driver.step(&instance).unwrap();
            }
            driver.fitness_history().to_vec()
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn elitism_preserves_best_individual_across_generations() {
        let instance = small_instance();
        let config = GaConfig::default()
            .with_population_size(12)
            .with_max_generations(1)
            .with_seed(5);
        let mut driver = GaDriver::new(&instance, config);
        driver.step(&instance).unwrap();
        assert!(driver.best_solution().is_some());
    }

    #[test]
    fn best_solution_records_the_generation_it_was_found_at() {
        let instance = small_instance();
        let config = GaConfig::default()
            .with_population_size(10)
            .with_max_generations(5)
            .with_seed(11);
        let mut driver = GaDriver::new(&instance, config);
        driver.step(&instance).unwrap();
        let first = driver.best_solution().unwrap();
        assert_eq!(first.iteration_found, 1);
    }

    #[test]
    fn stop_marks_complete() {
        let instance = small_instance();
        let config = GaConfig::default().with_population_size(4).with_seed(3);
        let mut driver = GaDriver::new(&instance, config);
        driver.stop();
        assert!(driver.is_complete());
    }
}
