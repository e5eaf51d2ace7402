//! JSON export/import of a complete optimization result.
//!
//! An exported solution bundles the problem instance, the evaluated
//! solution, and its visualization projections into one envelope so a host
//! application can persist or replay a run without recomputing anything.
//! Field naming is camelCase throughout, matching the rest of the crate's
//! `serde` types.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulerError};
use crate::models::{ProblemInstance, Solution};
use crate::visualization::{self, VisualizationData};

/// The complete persisted form of one optimization result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionEnvelope {
    /// The problem instance the solution was computed against.
    pub instance: ProblemInstance,
    /// The evaluated solution.
    pub solution: Solution,
    /// Chart-ready projections of `solution`, included for convenience so
    /// consumers don't need to recompute them.
    pub visualization: VisualizationData,
}

impl SolutionEnvelope {
    /// Builds an envelope from an instance and solution, deriving the
    /// visualization projections.
    pub fn new(instance: ProblemInstance, solution: Solution) -> Self {
        let visualization = visualization::build(&instance, &solution);
        Self {
            instance,
            solution,
            visualization,
        }
    }
}

/// Serializes a solution envelope to a pretty-printed JSON string.
pub fn serialize(envelope: &SolutionEnvelope) -> Result<String> {
    serde_json::to_string_pretty(envelope).map_err(|e| SchedulerError::ExportFailed {
        reason: e.to_string(),
    })
}

/// Deserializes a solution envelope from a JSON string, rejecting malformed
/// JSON and any envelope whose instance fails structural validation.
pub fn deserialize(json: &str) -> Result<SolutionEnvelope> {
    let envelope: SolutionEnvelope =
        serde_json::from_str(json).map_err(|e| SchedulerError::ImportFailed {
            reason: e.to_string(),
        })?;
    if !envelope.instance.validate() {
        return Err(SchedulerError::ImportFailed {
            reason: "imported instance failed validation".into(),
        });
    }
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Assignment, Task, VirtualMachine};
    use crate::scheduler;

    fn sample_envelope() -> SolutionEnvelope {
        let instance = ProblemInstance::new(
            vec![Task::new(1, 10.0, 1.0), Task::new(2, 10.0, 1.0).with_predecessor(1)],
            vec![VirtualMachine::new(1, 10.0, 10.0)],
        );
        let assignment: Assignment = [(1, 1), (2, 1)].into_iter().collect();
        let solution = scheduler::schedule(&instance, &assignment);
        SolutionEnvelope::new(instance, solution)
    }

    #[test]
    fn p5_round_trip_preserves_core_fields() {
        let envelope = sample_envelope();
        let json = serialize(&envelope).unwrap();
        let restored = deserialize(&json).unwrap();
        assert_eq!(restored.solution.assignment, envelope.solution.assignment);
        assert_eq!(restored.solution.makespan, envelope.solution.makespan);
        assert_eq!(restored.solution.total_penalty, envelope.solution.total_penalty);
        assert_eq!(restored.instance.task_ids(), envelope.instance.task_ids());
    }

    #[test]
    fn deserialize_rejects_malformed_json() {
        let err = deserialize("{ not json").unwrap_err();
        assert!(matches!(err, SchedulerError::ImportFailed { .. }));
    }

    #[test]
    fn deserialize_rejects_cyclic_instance() {
        let instance = ProblemInstance::new(
            vec![
                Task::new(1, 10.0, 1.0).with_predecessor(2),
                Task::new(2, 10.0, 1.0).with_predecessor(1),
            ],
            vec![VirtualMachine::new(1, 10.0, 10.0)],
        );
        let solution = Solution {
            assignment: Assignment::new(),
            makespan: f64::INFINITY,
            total_penalty: 0.0,
            fitness_history: vec![],
            computation_time: std::time::Duration::ZERO,
            iteration_found: 0,
            task_schedules: Default::default(),
            machine_schedules: Default::default(),
        };
        let envelope = SolutionEnvelope::new(instance, solution);
        let json = serialize(&envelope).unwrap();
        let err = deserialize(&json).unwrap_err();
        assert!(matches!(err, SchedulerError::ImportFailed { .. }));
    }
}
