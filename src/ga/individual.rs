//! Individual (chromosome) state for the GA driver.

use crate::models::{Assignment, Solution};

/// One member of the GA population: a candidate assignment plus the age
/// bookkeeping used for the aging/replacement policy.
#[derive(Debug, Clone)]
pub struct Individual {
    /// Candidate assignment.
    pub chromosome: Assignment,
    /// Most recent evaluation of `chromosome`, if any.
    pub solution: Option<Solution>,
    /// Generations survived since this individual (or its lineage as an
    /// elite) last improved on the population's best fitness.
    pub age: usize,
}

impl Individual {
    /// Creates a fresh, unevaluated individual with age zero.
    pub fn new(chromosome: Assignment) -> Self {
        Self {
            chromosome,
            solution: None,
            age: 0,
        }
    }

    /// Fitness of the last evaluation, or `+inf` if never evaluated.
    pub fn fitness(&self) -> f64 {
        self.solution.as_ref().map(|s| s.fitness()).unwrap_or(f64::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unevaluated_individual_has_infinite_fitness() {
        let individual = Individual::new(Assignment::new());
        assert_eq!(individual.fitness(), f64::INFINITY);
        assert_eq!(individual.age, 0);
    }
}
