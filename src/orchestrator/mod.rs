//! Orchestrator — the lifecycle state machine wrapping a search driver.
//!
//! The orchestrator owns at most one [`SearchDriver`] at a time (either a
//! [`crate::pso::PsoDriver`] or a [`crate::ga::GaDriver`]), advances it one
//! iteration at a time, and republishes its progress to any number of
//! registered [`ProgressObserver`]s. It is itself single-threaded
//! cooperative: exactly one iteration advances at a time, and the caller may
//! interleave other work between `step()` calls or via the yield hook passed
//! to `run()`.
//!
//! # Reference
//! State machine modeled after a conventional job-runner lifecycle:
//! `Idle -> Ready -> Running -> {Completed, Stopped, Error} -> Ready` (via
//! `reset()`).

mod driver_trait;
mod events;

pub use driver_trait::SearchDriver;
pub use events::{CompletionEvent, IterationEvent, ProgressEvent, ProgressObserver};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Result, SchedulerError};
use crate::ga::{GaConfig, GaDriver};
use crate::generation::{self, GenerationConfig};
use crate::models::{ProblemInstance, Solution};
use crate::pso::{PsoConfig, PsoDriver};
use crate::visualization::{self, VisualizationData};

/// Which search strategy the orchestrator is currently configured to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlgorithmKind {
    /// Discrete particle swarm optimization.
    #[default]
    Pso,
    /// Genetic algorithm.
    Ga,
}

/// Lifecycle state of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No problem instance has been set yet.
    Idle,
    /// A valid instance is set; no run has started (or one was reset).
    Ready,
    /// A driver is actively stepping.
    Running,
    /// The driver reached its termination condition normally.
    Completed,
    /// The run was cooperatively cancelled via `stop()`.
    Stopped,
    /// The last operation failed; see the error returned from that call.
    Error,
}

/// Opaque handle to a registered [`ProgressObserver`], used to unsubscribe it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

/// Owns the problem instance, the active search driver, and the lifecycle
/// state machine that ties them together.
pub struct Orchestrator {
    instance: Option<ProblemInstance>,
    algorithm: AlgorithmKind,
    pso_config: PsoConfig,
    ga_config: GaConfig,
    driver: Option<Box<dyn SearchDriver>>,
    status: Status,
    observers: Vec<(SubscriptionId, Box<dyn ProgressObserver>)>,
    next_subscription_id: usize,
    cancel: Arc<AtomicBool>,
    step_mode: bool,
    /// Wall-clock duration of the most recently finalized run, stamped onto
    /// the surfaced solution's `computation_time` (which otherwise reflects
    /// only the last scheduler evaluation, see `finalize_run`).
    run_duration: Option<Duration>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Creates an idle orchestrator with default PSO/GA configurations.
    pub fn new() -> Self {
        Self {
            instance: None,
            algorithm: AlgorithmKind::default(),
            pso_config: PsoConfig::default(),
            ga_config: GaConfig::default(),
            driver: None,
            status: Status::Idle,
            observers: Vec::new(),
            next_subscription_id: 0,
            cancel: Arc::new(AtomicBool::new(false)),
            step_mode: false,
            run_duration: None,
        }
    }

    /// Current lifecycle state.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The current problem instance, if one has been initialized.
    pub fn current_instance(&self) -> Option<&ProblemInstance> {
        self.instance.as_ref()
    }

    /// The best solution found so far by the active or most recent driver.
    ///
    /// `computation_time` is overwritten with the wall-clock duration of the
    /// most recently finalized run once one has completed; until then it
    /// reflects only the driver's last scheduler evaluation.
    pub fn current_solution(&self) -> Option<Solution> {
        let mut solution = self.driver.as_ref().and_then(|d| d.best_solution())?;
        if let Some(run_duration) = self.run_duration {
            solution.computation_time = run_duration;
        }
        Some(solution)
    }

    /// Chart-ready projections of `current_solution()`, or `None` if no
    /// solution has been found yet.
    pub fn visualization_data(&self) -> Option<VisualizationData> {
        let instance = self.instance.as_ref()?;
        let solution = self.current_solution()?;
        Some(visualization::build(instance, &solution))
    }

    /// The currently configured search strategy.
    pub fn algorithm(&self) -> AlgorithmKind {
        self.algorithm
    }

    /// Selects which search strategy the next `run()`/`start_step_mode()`
    /// call will use. Has no effect on an already-running driver.
    pub fn set_algorithm(&mut self, algorithm: AlgorithmKind) {
        self.algorithm = algorithm;
    }

    /// Current PSO configuration.
    pub fn pso_config(&self) -> &PsoConfig {
        &self.pso_config
    }

    /// Replaces the PSO configuration, after validating it.
    pub fn set_pso_config(&mut self, config: PsoConfig) -> Result<()> {
        if let Err(e) = config.validate() {
            self.status = Status::Error;
            log::error!("orchestrator: rejected pso config: {e}");
            return Err(e);
        }
        self.pso_config = config;
        Ok(())
    }

    /// Current GA configuration.
    pub fn ga_config(&self) -> &GaConfig {
        &self.ga_config
    }

    /// Replaces the GA configuration, after validating it.
    pub fn set_ga_config(&mut self, config: GaConfig) -> Result<()> {
        if let Err(e) = config.validate() {
            self.status = Status::Error;
            log::error!("orchestrator: rejected ga config: {e}");
            return Err(e);
        }
        self.ga_config = config;
        Ok(())
    }

    /// Registers a progress observer, returning a handle that can later be
    /// passed to [`Orchestrator::unsubscribe`].
    pub fn subscribe(&mut self, observer: Box<dyn ProgressObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription_id);
        self.next_subscription_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Removes a previously registered observer. A no-op if the handle is
    /// unknown (already unsubscribed, or from a prior `reset()`).
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.observers.retain(|(existing, _)| *existing != id);
    }

    /// Generates a new random [`ProblemInstance`] and adopts it, discarding
    /// any in-progress run. On validation failure the orchestrator
    /// transitions to `Error` and the previous instance (if any) is kept.
    pub fn initialize_random_instance(
        &mut self,
        task_count: usize,
        machine_count: usize,
        seed: Option<u64>,
        generation_config: Option<GenerationConfig>,
    ) -> Result<()> {
        let config = generation_config.unwrap_or_default();
        let instance =
            generation::initialize_random_instance(task_count, machine_count, seed, &config);
        self.adopt_instance(instance)
    }

    /// Adopts a caller-constructed instance in place of generating one,
    /// after validating it. Useful for host applications that import an
    /// instance rather than generating it.
    pub fn set_instance(&mut self, instance: ProblemInstance) -> Result<()> {
        self.adopt_instance(instance)
    }

    fn adopt_instance(&mut self, instance: ProblemInstance) -> Result<()> {
        let errors = instance.validation_errors();
        if !errors.is_empty() {
            let reason = errors
                .iter()
                .map(|e| e.message.clone())
                .collect::<Vec<_>>()
                .join("; ");
            self.status = Status::Error;
            log::error!("orchestrator: invalid instance: {reason}");
            return Err(SchedulerError::InvalidInstance { reason });
        }

        log::info!(
            "orchestrator: initialized instance with {} tasks, {} machines",
            instance.task_count(),
            instance.machine_count()
        );
        self.instance = Some(instance);
        self.driver = None;
        self.step_mode = false;
        self.status = Status::Ready;
        Ok(())
    }

    fn build_driver(&self, instance: &ProblemInstance) -> Box<dyn SearchDriver> {
        match self.algorithm {
            AlgorithmKind::Pso => Box::new(PsoDriver::new(instance, self.pso_config.clone())),
            AlgorithmKind::Ga => Box::new(GaDriver::new(instance, self.ga_config.clone())),
        }
    }

    /// Runs the active driver to completion (cap reached, no-improvement
    /// limit hit, or cancellation via `stop()`), invoking `yield_hook`
    /// between iterations so the caller can interleave UI work.
    ///
    /// Emits an [`IterationEvent`] and [`ProgressEvent`] after every
    /// iteration, and a [`CompletionEvent`] exactly once when the run ends.
    pub fn run(&mut self, mut yield_hook: impl FnMut()) -> Result<()> {
        self.begin_run(false)?;
        let started = Instant::now();

        loop {
            let driver = self.driver.as_mut().expect("begin_run guarantees a driver");
            if driver.is_complete() {
                break;
            }
            if self.cancel.load(Ordering::Relaxed) {
                driver.stop();
                break;
            }

            let instance = self.instance.as_ref().expect("begin_run guarantees an instance");
            driver.step(instance)?;
            self.emit_iteration_and_progress();
            yield_hook();
        }

        self.finalize_run(started);
        Ok(())
    }

    /// Switches into explicit single-iteration mode: builds a fresh driver
    /// but does not advance it. Call `step()` repeatedly to make progress.
    pub fn start_step_mode(&mut self) -> Result<()> {
        self.begin_run(true)
    }

    /// Whether `step()` may currently be called productively: initialized,
    /// in step mode, running, and not yet complete.
    pub fn can_step(&self) -> bool {
        self.step_mode
            && self.status == Status::Running
            && self
                .driver
                .as_ref()
                .map(|d| !d.is_complete())
                .unwrap_or(false)
    }

    /// Advances the active driver by exactly one iteration/generation.
    pub fn step(&mut self) -> Result<()> {
        if self.instance.is_none() {
            self.status = Status::Error;
            return Err(SchedulerError::NotInitialized);
        }
        if !self.can_step() {
            return Ok(());
        }

        let started = Instant::now();
        {
            let instance = self.instance.as_ref().expect("checked above");
            let driver = self.driver.as_mut().expect("checked above");
            driver.step(instance)?;
        }
        self.emit_iteration_and_progress();

        if self.driver.as_ref().expect("checked above").is_complete() {
            self.finalize_run(started);
        }
        Ok(())
    }

    /// Requests cooperative cancellation. In `run()` mode the in-flight
    /// iteration finishes and the loop exits before the next one starts; in
    /// step mode the driver is torn down immediately.
    pub fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(driver) = self.driver.as_mut() {
            driver.stop();
        }
        if self.step_mode && self.status == Status::Running {
            self.status = Status::Stopped;
            self.driver = None;
            self.step_mode = false;
            log::info!("orchestrator: stopped in step mode");
        }
    }

    /// Discards the active driver and returns to `Ready` (or `Idle` if no
    /// instance has ever been set). Unregisters all observers.
    pub fn reset(&mut self) {
        self.driver = None;
        self.step_mode = false;
        self.cancel.store(false, Ordering::Relaxed);
        self.observers.clear();
        self.next_subscription_id = 0;
        self.run_duration = None;
        self.status = if self.instance.is_some() {
            Status::Ready
        } else {
            Status::Idle
        };
    }

    fn begin_run(&mut self, step_mode: bool) -> Result<()> {
        let instance = match self.instance.as_ref() {
            Some(i) => i,
            None => {
                self.status = Status::Error;
                return Err(SchedulerError::NotInitialized);
            }
        };
        if self.status == Status::Running {
            self.status = Status::Error;
            return Err(SchedulerError::AlreadyRunning);
        }

        self.driver = Some(self.build_driver(instance));
        self.cancel.store(false, Ordering::Relaxed);
        self.step_mode = step_mode;
        self.run_duration = None;
        self.status = Status::Running;
        log::info!(
            "orchestrator: starting run with algorithm={:?}, step_mode={}",
            self.algorithm,
            step_mode
        );
        Ok(())
    }

    fn finalize_run(&mut self, started: Instant) {
        let driver = match self.driver.as_ref() {
            Some(d) => d,
            None => return,
        };
        let cancelled = self.cancel.load(Ordering::Relaxed);
        self.status = if cancelled {
            Status::Stopped
        } else {
            Status::Completed
        };

        let mut best_solution = driver.best_solution();
        let total_iterations = driver.iterations_completed();
        let computation_time = started.elapsed();
        self.run_duration = Some(computation_time);
        if let Some(solution) = best_solution.as_mut() {
            solution.computation_time = computation_time;
        }

        log::info!(
            "orchestrator: run {} after {} iterations in {:?}, best_fitness={}",
            if cancelled { "stopped" } else { "completed" },
            total_iterations,
            computation_time,
            best_solution.as_ref().map(|s| s.fitness()).unwrap_or(f64::INFINITY)
        );

        let event = CompletionEvent {
            best_solution,
            total_iterations,
            computation_time,
        };
        for (_, observer) in self.observers.iter_mut() {
            observer.on_completed(&event);
        }
    }

    fn emit_iteration_and_progress(&mut self) {
        let driver = match self.driver.as_ref() {
            Some(d) => d,
            None => return,
        };
        let iteration = driver.iterations_completed();
        let best_solution = driver.best_solution();
        let best_fitness = best_solution.as_ref().map(|s| s.fitness()).unwrap_or(f64::INFINITY);
        let average_fitness = driver.average_fitness().unwrap_or(f64::INFINITY);
        let is_complete = driver.is_complete();

        let iteration_event = IterationEvent {
            iteration,
            best_solution: best_solution.clone(),
            best_fitness,
            average_fitness,
        };
        let progress_event = ProgressEvent {
            iteration,
            best_solution,
            best_fitness,
            average_fitness,
            is_complete,
        };
        for (_, observer) in self.observers.iter_mut() {
            observer.on_iteration(&iteration_event);
            observer.on_progress(&progress_event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, VirtualMachine};

    fn chain_instance() -> ProblemInstance {
        ProblemInstance::new(
            vec![
                Task::new(1, 10.0, 1.0),
                Task::new(2, 10.0, 1.0).with_predecessor(1),
                Task::new(3, 10.0, 1.0).with_predecessor(2),
            ],
            vec![VirtualMachine::new(1, 10.0, 10.0), VirtualMachine::new(2, 5.0, 10.0)],
        )
    }

    #[test]
    fn starts_idle_and_errors_before_initialization() {
        let mut orchestrator = Orchestrator::new();
        assert_eq!(orchestrator.status(), Status::Idle);
        let err = orchestrator.run(|| {}).unwrap_err();
        assert!(matches!(err, SchedulerError::NotInitialized));
        assert_eq!(orchestrator.status(), Status::Error);
    }

    #[test]
    fn initialize_random_instance_transitions_to_ready() {
        let mut orchestrator = Orchestrator::new();
        orchestrator
            .initialize_random_instance(10, 2, Some(1), None)
            .unwrap();
        assert_eq!(orchestrator.status(), Status::Ready);
        assert!(orchestrator.current_instance().is_some());
    }

    #[test]
    fn set_instance_rejects_cyclic_instance() {
        let mut orchestrator = Orchestrator::new();
        let instance = ProblemInstance::new(
            vec![
                Task::new(1, 10.0, 1.0).with_predecessor(2),
                Task::new(2, 10.0, 1.0).with_predecessor(1),
            ],
            vec![VirtualMachine::new(1, 10.0, 10.0)],
        );
        let err = orchestrator.set_instance(instance).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidInstance { .. }));
        assert_eq!(orchestrator.status(), Status::Error);
    }

    #[test]
    fn run_completes_and_reports_solution() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.set_instance(chain_instance()).unwrap();
        orchestrator
            .set_pso_config(PsoConfig::default().with_swarm_size(6).with_max_iterations(8).with_seed(3))
            .unwrap();
        orchestrator.run(|| {}).unwrap();
        assert_eq!(orchestrator.status(), Status::Completed);
        assert!(orchestrator.current_solution().is_some());
    }

    #[test]
    fn completed_run_stamps_total_duration_and_fitness_history_onto_solution() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.set_instance(chain_instance()).unwrap();
        orchestrator
            .set_pso_config(PsoConfig::default().with_swarm_size(6).with_max_iterations(8).with_seed(3))
            .unwrap();
        orchestrator.run(|| {}).unwrap();

        let solution = orchestrator.current_solution().unwrap();
        assert!(!solution.fitness_history.is_empty());
        // computation_time reflects the whole run, not a single microsecond-scale
        // scheduler evaluation, so it must be at least as long as the run itself
        // took to report (flaky only if the clock runs backwards).
        assert!(solution.computation_time.as_nanos() > 0);
    }

    #[test]
    fn run_twice_in_a_row_is_not_already_running() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.set_instance(chain_instance()).unwrap();
        orchestrator
            .set_ga_config(GaConfig::default().with_population_size(6).with_max_generations(4).with_seed(1))
            .unwrap();
        orchestrator.set_algorithm(AlgorithmKind::Ga);
        orchestrator.run(|| {}).unwrap();
        assert_eq!(orchestrator.status(), Status::Completed);
        orchestrator.run(|| {}).unwrap();
        assert_eq!(orchestrator.status(), Status::Completed);
    }

    #[test]
    fn step_mode_advances_one_iteration_at_a_time() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.set_instance(chain_instance()).unwrap();
        orchestrator
            .set_pso_config(PsoConfig::default().with_swarm_size(4).with_max_iterations(3).with_seed(2))
            .unwrap();
        orchestrator.start_step_mode().unwrap();
        assert!(orchestrator.can_step());
        orchestrator.step().unwrap();
        assert_eq!(orchestrator.status(), Status::Running);
        orchestrator.step().unwrap();
        orchestrator.step().unwrap();
        assert_eq!(orchestrator.status(), Status::Completed);
        assert!(!orchestrator.can_step());
    }

    #[test]
    fn stop_in_step_mode_tears_down_driver_immediately() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.set_instance(chain_instance()).unwrap();
        orchestrator.start_step_mode().unwrap();
        orchestrator.stop();
        assert_eq!(orchestrator.status(), Status::Stopped);
        assert!(!orchestrator.can_step());
    }

    #[test]
    fn reset_returns_to_ready_and_clears_observers() {
        struct CountingObserver {
            calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
        }
        impl ProgressObserver for CountingObserver {
            fn on_iteration(&mut self, _event: &IterationEvent) {
                self.calls.fetch_add(1, Ordering::Relaxed);
            }
        }

        let mut orchestrator = Orchestrator::new();
        orchestrator.set_instance(chain_instance()).unwrap();
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        orchestrator.subscribe(Box::new(CountingObserver { calls: calls.clone() }));
        orchestrator
            .set_pso_config(PsoConfig::default().with_swarm_size(4).with_max_iterations(2).with_seed(1))
            .unwrap();
        orchestrator.run(|| {}).unwrap();
        let calls_before_reset = calls.load(Ordering::Relaxed);
        assert!(calls_before_reset > 0);

        orchestrator.reset();
        assert_eq!(orchestrator.status(), Status::Ready);
        orchestrator.run(|| {}).unwrap();
        // Observer was dropped on reset, so the call count is unchanged.
        assert_eq!(calls.load(Ordering::Relaxed), calls_before_reset);
    }

    #[test]
    fn already_running_is_rejected() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.set_instance(chain_instance()).unwrap();
        orchestrator.start_step_mode().unwrap();
        let err = orchestrator.start_step_mode().unwrap_err();
        assert!(matches!(err, SchedulerError::AlreadyRunning));
    }
}
