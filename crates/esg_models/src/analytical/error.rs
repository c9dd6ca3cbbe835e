//! Error types for analytical formulas.

use esg_core::types::SolverError;
use thiserror::Error;

/// Analytical formula errors.
///
/// # Examples
/// ```
/// use esg_models::analytical::AnalyticalError;
///
/// let err = AnalyticalError::InvalidVolatility { volatility: -0.2 };
/// assert!(format!("{}", err).contains("volatility"));
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalyticalError {
    /// Non-positive volatility.
    #[error("Invalid volatility: σ = {volatility}")]
    InvalidVolatility {
        /// The invalid volatility value
        volatility: f64,
    },

    /// Non-positive time to expiry.
    #[error("Invalid expiry: T = {expiry}")]
    InvalidExpiry {
        /// The invalid expiry
        expiry: f64,
    },

    /// Price below intrinsic value, so no volatility reproduces it.
    #[error("Price {price} is below intrinsic value {intrinsic}")]
    PriceBelowIntrinsic {
        /// Target price
        price: f64,
        /// Intrinsic value of the option
        intrinsic: f64,
    },

    /// Implied volatility root search failed.
    #[error("Implied volatility search failed: {0}")]
    Solver(#[from] SolverError),
}
