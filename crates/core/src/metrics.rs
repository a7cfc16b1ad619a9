//! Report rows emitted by the optimization run.
//!
//! The core produces these as plain data; external reporting/plotting
//! collaborators consume them.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-iteration state of one log.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IterationRecord {
    /// Iteration number.
    pub iteration: usize,
    /// Log the row describes.
    pub log_id: usize,
    /// Score under the configured weights.
    pub score: f64,
    /// Kerf loss area.
    pub saw_dust: f64,
    /// Board area placed.
    pub volume_used: f64,
    /// `volume_used / volume`.
    pub efficiency: f64,
}

/// Per-iteration state of one operator.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MethodRecord {
    /// Iteration number.
    pub iteration: usize,
    /// Operator name.
    pub method: String,
    /// Selection probability within the operator's goal group.
    pub probability: f64,
    /// Invocations so far.
    pub times_called: u64,
    /// Attempts so far (one invocation may retry several times).
    pub times_attempted: u64,
    /// Successful invocations so far.
    pub times_succeeded: u64,
    /// Cumulative wall time spent inside the operator, in milliseconds.
    pub elapsed_ms: u64,
}

/// One placed board in the final solution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacementRecord {
    /// Log holding the board.
    pub log_id: usize,
    /// Catalog type of the board.
    pub shape_type_id: usize,
    /// Lower-left corner x.
    pub x: f64,
    /// Lower-left corner y.
    pub y: f64,
}

/// Full output of an optimization run.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunReport {
    /// Final placement, one row per board.
    pub placements: Vec<PlacementRecord>,
    /// One row per log per iteration.
    pub iterations: Vec<IterationRecord>,
    /// One row per operator per iteration.
    pub methods: Vec<MethodRecord>,
    /// Iterations actually executed.
    pub iterations_run: usize,
    /// Temperature when the run ended.
    pub final_temperature: f64,
    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: u64,
}

impl RunReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows for one log, in iteration order.
    pub fn iterations_for_log(&self, log_id: usize) -> impl Iterator<Item = &IterationRecord> {
        self.iterations.iter().filter(move |r| r.log_id == log_id)
    }
}
