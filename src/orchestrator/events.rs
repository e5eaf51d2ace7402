//! Progress events and the observer contract.

use std::time::Duration;

use crate::models::Solution;

/// One iteration/generation's worth of progress, reported after each step.
#[derive(Debug, Clone)]
pub struct IterationEvent {
    /// Iteration or generation index just completed.
    pub iteration: usize,
    /// Deep copy of the best-known solution as of this iteration.
    pub best_solution: Option<Solution>,
    /// Fitness of `best_solution`.
    pub best_fitness: f64,
    /// Mean fitness across the current population/swarm.
    pub average_fitness: f64,
}

/// A superset of [`IterationEvent`] emitted on every `run()` tick, adding
/// whether the driver has reached completion.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Iteration or generation index just completed.
    pub iteration: usize,
    /// Deep copy of the best-known solution as of this progress tick.
    pub best_solution: Option<Solution>,
    /// Fitness of `best_solution`.
    pub best_fitness: f64,
    /// Mean fitness across the current population/swarm.
    pub average_fitness: f64,
    /// Whether the driver has reached completion (cap or no-improvement limit).
    pub is_complete: bool,
}

/// Emitted exactly once when a `run()` call finishes, whether by completion
/// or cooperative cancellation.
#[derive(Debug, Clone)]
pub struct CompletionEvent {
    /// Best solution found over the whole run, if any iteration completed.
    pub best_solution: Option<Solution>,
    /// Total iterations/generations completed.
    pub total_iterations: usize,
    /// Wall-clock time spent in `run()`.
    pub computation_time: Duration,
}

/// Observer/sink for orchestrator progress. Registered consumers receive
/// every event a run produces; there is no back-pressure — a slow observer
/// should buffer internally.
pub trait ProgressObserver: Send {
    /// Called after every completed iteration/generation.
    fn on_iteration(&mut self, _event: &IterationEvent) {}

    /// Called on every `run()` tick (same cadence as `on_iteration` in batch
    /// mode; once per `step()` call in step mode).
    fn on_progress(&mut self, _event: &ProgressEvent) {}

    /// Called exactly once when a run finishes.
    fn on_completed(&mut self, _event: &CompletionEvent) {}
}
