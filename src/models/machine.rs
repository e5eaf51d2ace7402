//! Virtual machine model.
//!
//! A virtual machine is the resource that tasks execute on. Each machine
//! has a fixed compute rate ("performance") and a fixed memory capacity.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1.2

use serde::{Deserialize, Serialize};

/// Unique virtual machine identifier.
pub type MachineId = u64;

/// A virtual machine that tasks can be assigned to.
///
/// # Transient fields
///
/// `last_completion_time` and `assigned_tasks` are populated by the
/// scheduler on a private, per-evaluation copy. They are never set on the
/// canonical instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    /// Unique identifier.
    pub id: MachineId,
    /// Work units this machine completes per unit of time. Must be positive;
    /// a non-positive value is treated as infinitely slow (execution time = +∞).
    pub performance: f64,
    /// Memory available for tasks assigned to this machine.
    pub available_memory: f64,

    /// Completion time of the last task scheduled on this machine, as of
    /// the last evaluation.
    pub last_completion_time: Option<f64>,
    /// Ids of tasks assigned to this machine, in scheduled order, as of the
    /// last evaluation.
    pub assigned_tasks: Vec<u64>,
}

impl VirtualMachine {
    /// Creates a new machine with no transient schedule state.
    pub fn new(id: MachineId, performance: f64, available_memory: f64) -> Self {
        Self {
            id,
            performance,
            available_memory,
            last_completion_time: None,
            assigned_tasks: Vec::new(),
        }
    }

    /// Clears all transient per-evaluation fields.
    pub fn reset_transient(&self) -> Self {
        Self {
            id: self.id,
            performance: self.performance,
            available_memory: self.available_memory,
            last_completion_time: None,
            assigned_tasks: Vec::new(),
        }
    }

    /// Whether this machine has enough memory for the given requirement.
    pub fn can_host(&self, memory_requirement: f64) -> bool {
        memory_requirement <= self.available_memory
    }

    /// Execution time for a task of the given computation volume on this
    /// machine. Non-positive performance is treated as infinitely slow.
    pub fn execution_time(&self, computation_volume: f64) -> f64 {
        if self.performance <= 0.0 {
            f64::INFINITY
        } else {
            computation_volume / self.performance
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_host() {
        let m = VirtualMachine::new(1, 10.0, 20.0);
        assert!(m.can_host(20.0));
        assert!(!m.can_host(20.1));
    }

    #[test]
    fn test_execution_time() {
        let m = VirtualMachine::new(1, 10.0, 20.0);
        assert_eq!(m.execution_time(100.0), 10.0);
    }

    #[test]
    fn test_execution_time_zero_performance() {
        let m = VirtualMachine::new(1, 0.0, 20.0);
        assert!(m.execution_time(100.0).is_infinite());
    }
}
