//! Market data error types.

use thiserror::Error;

/// Market data validation errors.
///
/// # Examples
///
/// ```
/// use esg_core::market_data::MarketDataError;
///
/// let err = MarketDataError::InvalidRate { index: 2, rate: -1.5 };
/// assert!(format!("{}", err).contains("-1.5"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Maturity not strictly after the previous pillar.
    #[error("Maturity {maturity} at index {index} is not strictly increasing")]
    NonIncreasingMaturity {
        /// Pillar index
        index: usize,
        /// Offending maturity in years
        maturity: u32,
    },

    /// Rate is not finite or implies a non-positive discount factor.
    #[error("Invalid rate {rate} at index {index}")]
    InvalidRate {
        /// Pillar index
        index: usize,
        /// Offending rate
        rate: f64,
    },

    /// Zero-coupon price is not in `(0, ∞)`.
    #[error("Invalid zero-coupon price {price} at index {index}")]
    InvalidPrice {
        /// Pillar index
        index: usize,
        /// Offending price
        price: f64,
    },

    /// Invalid maturity (zero years).
    #[error("Invalid maturity: {maturity} years")]
    InvalidMaturity {
        /// The invalid maturity value
        maturity: u32,
    },

    /// Not enough pillars for construction.
    #[error("Insufficient data: got {got}, need at least {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number required
        need: usize,
    },

    /// Invalid model parameter for generated curves.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },
}
