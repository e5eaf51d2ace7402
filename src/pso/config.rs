//! Particle swarm configuration.

use crate::error::{Result, SchedulerError};

/// Tuning parameters for [`super::PsoDriver`].
///
/// # Example
///
/// ```
/// use vm_task_scheduler::pso::PsoConfig;
///
/// let config = PsoConfig::default().with_swarm_size(20).with_seed(7);
/// assert_eq!(config.swarm_size, 20);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PsoConfig {
    /// Number of particles in the swarm.
    pub swarm_size: usize,
    /// Hard iteration cap.
    pub max_iterations: usize,
    /// Inertia weight `w`, in `[0, 1]`.
    pub inertia_weight: f64,
    /// Cognitive (personal-best pull) weight `c1`, `>= 0`.
    pub cognitive_weight: f64,
    /// Social (global-best pull) weight `c2`, `>= 0`.
    pub social_weight: f64,
    /// Stop early after this many consecutive non-improving iterations.
    pub no_improvement_limit: usize,
    /// Seed for the driver's RNG. `None` seeds from entropy.
    pub random_seed: Option<u64>,
}

impl Default for PsoConfig {
    fn default() -> Self {
        Self {
            swarm_size: 50,
            max_iterations: 500,
            inertia_weight: 0.7,
            cognitive_weight: 1.5,
            social_weight: 1.5,
            no_improvement_limit: 50,
            random_seed: None,
        }
    }
}

impl PsoConfig {
    /// Overrides swarm size, returning `self` for chaining.
    pub fn with_swarm_size(mut self, swarm_size: usize) -> Self {
        self.swarm_size = swarm_size;
        self
    }

    /// Overrides the iteration cap, returning `self` for chaining.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Overrides the inertia weight, returning `self` for chaining.
    pub fn with_inertia_weight(mut self, inertia_weight: f64) -> Self {
        self.inertia_weight = inertia_weight;
        self
    }

    /// Overrides the no-improvement stopping limit, returning `self` for chaining.
    pub fn with_no_improvement_limit(mut self, limit: usize) -> Self {
        self.no_improvement_limit = limit;
        self
    }

    /// Overrides the RNG seed, returning `self` for chaining.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Validates the configuration, returning `InvalidConfig` on violation.
    pub fn validate(&self) -> Result<()> {
        if self.swarm_size == 0 {
            return Err(SchedulerError::InvalidConfig {
                reason: "swarm_size must be >= 1".into(),
            });
        }
        if self.max_iterations == 0 {
            return Err(SchedulerError::InvalidConfig {
                reason: "max_iterations must be >= 1".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.inertia_weight) {
            return Err(SchedulerError::InvalidConfig {
                reason: "inertia_weight must be in [0, 1]".into(),
            });
        }
        if self.cognitive_weight < 0.0 || self.social_weight < 0.0 {
            return Err(SchedulerError::InvalidConfig {
                reason: "cognitive_weight and social_weight must be >= 0".into(),
            });
        }
        if self.no_improvement_limit == 0 {
            return Err(SchedulerError::InvalidConfig {
                reason: "no_improvement_limit must be >= 1".into(),
            });
        }
        Ok(())
    }
}
