//! Particle state for the PSO driver.

use std::collections::HashMap;

use crate::models::{Assignment, Solution, TaskId};

/// One particle in the swarm: a candidate assignment plus the velocity and
/// personal-best bookkeeping PSO needs to move it.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Current candidate assignment.
    pub position: Assignment,
    /// Per-task propensity to jump to a different machine, in `[0, 1]`.
    pub velocity: HashMap<TaskId, f64>,
    /// Best assignment this particle has ever held.
    pub best_position: Assignment,
    /// Fitness of `best_position`.
    pub best_fitness: f64,
    /// Most recently evaluated solution for `position`.
    pub current_solution: Option<Solution>,
    /// Solution corresponding to `best_position`.
    pub best_solution: Option<Solution>,
}

impl Particle {
    /// Creates a particle at `position` with zero-velocity(ish) initial
    /// state: velocity sampled uniformly, personal best unset.
    pub fn new(position: Assignment, velocity: HashMap<TaskId, f64>) -> Self {
        let best_position = position.clone();
        Self {
            position,
            velocity,
            best_position,
            best_fitness: f64::INFINITY,
            current_solution: None,
            best_solution: None,
        }
    }
}
