//! Error taxonomy for the packing engine.
//!
//! Three failure classes exist:
//!
//! - [`Error::SolverInfeasible`]: the knapsack solve returned non-optimal for
//!   a model that always admits the empty solution. Fatal; indicates a
//!   modeling bug, not bad input.
//! - [`Error::GeometryDomain`]: a circle-chord query received a coordinate
//!   outside `[0, diameter]`. Hard failure at the geometry layer, but repair
//!   operators catch it and report an ordinary operator failure instead.
//! - [`Error::InvariantViolation`]: a feasibility sweep found overlapping or
//!   out-of-bounds shapes in a committed log. Fatal; a logic defect upstream.
//!
//! Operator failure ("no candidate fits", "no clearance") is never an error;
//! operators report it as a `false` result that feeds performance decay.

use thiserror::Error;

/// Errors produced by the packing engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The LP/knapsack solver did not reach optimality.
    #[error("knapsack solve did not reach optimality: {0}")]
    SolverInfeasible(String),

    /// A chord query received a coordinate outside the circle's domain.
    #[error("coordinate {coordinate} outside circle domain [0, {diameter}]")]
    GeometryDomain {
        /// The offending coordinate.
        coordinate: f64,
        /// The log diameter defining the valid domain.
        diameter: f64,
    },

    /// A committed log state violates the no-overlap or containment invariant.
    #[error("geometric invariant violated: {0}")]
    InvariantViolation(String),
}

impl Error {
    /// Returns true for domain errors that repair operators demote to an
    /// ordinary operator failure.
    pub fn is_geometry_domain(&self) -> bool {
        matches!(self, Error::GeometryDomain { .. })
    }
}

/// Result alias used across the engine.
pub type Result<T> = std::result::Result<T, Error>;
