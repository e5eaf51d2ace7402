//! Crate-wide error type.
//!
//! Every fallible operation in the public API returns [`SchedulerError`].
//! A failed single-candidate evaluation is *not* represented here — per the
//! concurrency model, it is absorbed locally into a `+inf`-fitness sentinel
//! and logged, never propagated as an error (see [`crate::scheduler`]).

use thiserror::Error;

/// Errors surfaced by the orchestrator and its collaborators.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// An operation that requires a problem instance was invoked before one
    /// was set (e.g. `run()` before `initialize_random_instance()`).
    #[error("no problem instance has been initialized")]
    NotInitialized,

    /// `run()` or `start_step_mode()` was invoked while a run was already in
    /// progress.
    #[error("a run is already in progress")]
    AlreadyRunning,

    /// The problem instance failed structural validation (cycle in the
    /// precedence graph, or some other integrity violation).
    #[error("invalid problem instance: {reason}")]
    InvalidInstance {
        /// Human-readable description of the violation.
        reason: String,
    },

    /// A driver configuration value was out of range or violated a derived
    /// constraint (e.g. `tournament_size > population_size`).
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the violation.
        reason: String,
    },

    /// The run was cooperatively cancelled via `stop()`. Not an application
    /// error: the orchestrator transitions to `Stopped`, not `Error`.
    #[error("run was cancelled")]
    Cancelled,

    /// Serializing a solution envelope to JSON failed.
    #[error("failed to export solution: {reason}")]
    ExportFailed {
        /// Human-readable description of the failure.
        reason: String,
    },

    /// Deserializing a solution envelope from JSON failed, or the
    /// deserialized instance failed validation.
    #[error("failed to import solution: {reason}")]
    ImportFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
}

/// Convenience alias for `Result<T, SchedulerError>`.
pub type Result<T> = std::result::Result<T, SchedulerError>;
