//! Closed-form formulas shared by the models and calibrators.
//!
//! - [`norm_cdf`] / [`norm_pdf`]: standard normal distribution
//! - [`Bachelier`]: normal-model option prices and implied normal volatility
//!
//! Generic over `T: Float` so the formulas can be reused outside `f64`.

pub mod bachelier;
pub mod distributions;
pub mod error;

pub use bachelier::Bachelier;
pub use distributions::{norm_cdf, norm_pdf};
pub use error::AnalyticalError;
