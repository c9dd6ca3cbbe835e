//! Errors of the numerical kernels.
//!
//! - [`InterpolationError`]: curve spline construction and evaluation
//! - [`SolverError`]: bracketing root finder

use thiserror::Error;

/// Spline construction or evaluation failed.
///
/// ```
/// use esg_core::types::InterpolationError;
///
/// let err = InterpolationError::OutOfBounds { x: 45.0, min: 0.0, max: 30.0 };
/// assert_eq!(err.to_string(), "Maturity 45 outside curve range [0, 30]");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    /// Query outside the knot range; curves are never extrapolated.
    #[error("Maturity {x} outside curve range [{min}, {max}]")]
    OutOfBounds {
        /// Queried abscissa
        x: f64,
        /// First knot
        min: f64,
        /// Last knot
        max: f64,
    },

    /// Too few knots for the spline.
    #[error("Spline needs at least {need} knots, got {got}")]
    InsufficientData {
        /// Knots supplied
        got: usize,
        /// Knots required
        need: usize,
    },

    /// Knot `index` does not exceed its predecessor.
    #[error("Knots must be strictly increasing, violated at index {index}")]
    NonMonotonicData {
        /// First offending knot
        index: usize,
    },

    /// Malformed knots or values.
    #[error("Invalid spline input: {0}")]
    InvalidInput(String),
}

/// Root finding failed.
///
/// ```
/// use esg_core::types::SolverError;
///
/// let err = SolverError::MaxIterationsExceeded { iterations: 100 };
/// assert!(err.to_string().contains("100"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Tolerance not reached within the iteration budget.
    #[error("Root not found within {iterations} iterations")]
    MaxIterationsExceeded {
        /// Iterations performed
        iterations: usize,
    },

    /// The function has the same sign at both ends of the bracket.
    #[error("Root not bracketed by [{a}, {b}]")]
    NoBracket {
        /// Lower end
        a: f64,
        /// Upper end
        b: f64,
    },

    /// The function returned NaN or an infinity.
    #[error("Non-finite objective: {0}")]
    NumericalInstability(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_messages() {
        let err = InterpolationError::InsufficientData { got: 1, need: 3 };
        assert_eq!(err.to_string(), "Spline needs at least 3 knots, got 1");

        let err = InterpolationError::NonMonotonicData { index: 3 };
        assert_eq!(err.to_string(), "Knots must be strictly increasing, violated at index 3");
    }

    #[test]
    fn test_solver_messages() {
        let err = SolverError::NoBracket { a: 0.0, b: 1.0 };
        assert_eq!(err.to_string(), "Root not bracketed by [0, 1]");

        let err = SolverError::NumericalInstability("NaN at x = 0.5".to_string());
        let _: &dyn std::error::Error = &err;
        assert!(err.to_string().contains("NaN"));
    }
}
