//! Risk factors and their joint correlation structure.
//!
//! - [`correlated`]: validated correlation matrices and Cholesky factors
//! - [`risk_factor`]: the five named risk factors, their two orderings and
//!   calibrated correlation presets

pub mod correlated;
pub mod risk_factor;

pub use correlated::{CholeskyFactor, CorrelationError, CorrelationMatrix};
pub use risk_factor::{FactorCorrelation, RiskFactor, N_FACTORS};
