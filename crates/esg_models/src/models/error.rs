//! Model parameter and evaluation errors.

use esg_core::types::{InterpolationError, SolverError};
use thiserror::Error;

/// Errors raised while building or evaluating a model.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    /// A parameter is outside its admissible range.
    #[error("Invalid {model} parameter {name} = {value}")]
    InvalidParameter {
        /// Model the parameter belongs to
        model: &'static str,
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// The initial curve could not be evaluated.
    #[error("Initial curve evaluation failed: {0}")]
    Curve(#[from] InterpolationError),

    /// A root search inside a closed form failed.
    #[error("Root search failed: {0}")]
    Solver(#[from] SolverError),
}

impl ModelError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(model: &'static str, name: &'static str, value: f64) -> Self {
        ModelError::InvalidParameter { model, name, value }
    }
}

/// Reject non-finite values and values not strictly above `lower`.
pub(crate) fn require_above(
    model: &'static str,
    name: &'static str,
    value: f64,
    lower: f64,
) -> Result<(), ModelError> {
    if value.is_finite() && value > lower {
        Ok(())
    } else {
        Err(ModelError::invalid_parameter(model, name, value))
    }
}

/// Reject non-finite values and values outside `[lower, upper]`.
pub(crate) fn require_within(
    model: &'static str,
    name: &'static str,
    value: f64,
    lower: f64,
    upper: f64,
) -> Result<(), ModelError> {
    if value.is_finite() && value >= lower && value <= upper {
        Ok(())
    } else {
        Err(ModelError::invalid_parameter(model, name, value))
    }
}
