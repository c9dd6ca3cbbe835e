//! Calibration error types.
//!
//! Calibration failures abort scenario generation: bad market inputs must be
//! corrected upstream, so nothing here is retried automatically.

use esg_core::types::{InterpolationError, SolverError};
use thiserror::Error;

use crate::models::hybrid::CorrelationError;
use crate::models::ModelError;

/// Calibration error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Not enough market data points.
    #[error("Insufficient market data (required: {required}, provided: {provided})")]
    InsufficientData {
        /// Minimum required data points
        required: usize,
        /// Actual data points provided
        provided: usize,
    },

    /// Market data failed validation.
    #[error("Invalid market data: {message}")]
    InvalidMarketData {
        /// Description of the validation failure
        message: String,
    },

    /// Calibration configuration failed validation.
    #[error("Invalid calibration settings: {message}")]
    InvalidSettings {
        /// Description of the invalid setting
        message: String,
    },

    /// Every swaption weight is zero, so the objective is undefined.
    #[error("Total swaption weight is zero ({quotes} quotes, liquid count {liquid_count})")]
    ZeroTotalWeight {
        /// Number of quotes supplied
        quotes: usize,
        /// Number of leading quotes given unit weight
        liquid_count: usize,
    },

    /// NaN, Inf or no admissible candidate.
    #[error("Numerical instability: {message}")]
    NumericalInstability {
        /// Description of the numerical issue
        message: String,
    },

    /// Correlation matrix cannot be used.
    #[error("Correlation matrix rejected: {0}")]
    Correlation(#[from] CorrelationError),

    /// Curve interpolation failed.
    #[error("Curve interpolation failed: {0}")]
    Interpolation(#[from] InterpolationError),

    /// Root search failed.
    #[error("Root search failed: {0}")]
    Solver(#[from] SolverError),

    /// Model construction or evaluation failed.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl CalibrationError {
    /// Create an insufficient data error.
    pub fn insufficient_data(required: usize, provided: usize) -> Self {
        CalibrationError::InsufficientData { required, provided }
    }

    /// Create an invalid market data error.
    pub fn invalid_market_data(message: impl Into<String>) -> Self {
        CalibrationError::InvalidMarketData {
            message: message.into(),
        }
    }

    /// Create an invalid settings error.
    pub fn invalid_settings(message: impl Into<String>) -> Self {
        CalibrationError::InvalidSettings {
            message: message.into(),
        }
    }

    /// Create a numerical instability error.
    pub fn numerical_instability(message: impl Into<String>) -> Self {
        CalibrationError::NumericalInstability {
            message: message.into(),
        }
    }

    /// Whether the failure comes from the market inputs rather than the numerics.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            CalibrationError::InsufficientData { .. }
                | CalibrationError::InvalidMarketData { .. }
                | CalibrationError::ZeroTotalWeight { .. }
                | CalibrationError::Correlation(_)
        )
    }
}
