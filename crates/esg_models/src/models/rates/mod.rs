//! Interest rate models.
//!
//! - [`hull_white`]: Hull-White one-factor parameters, the exact one-step
//!   transition and zero-coupon bond closed forms
//! - [`swaption`]: swap schedules and Jamshidian swaption prices
//! - [`risk_premium`]: mean-reverting market price of risk for the
//!   real-world overlay
//!
//! Closed forms are evaluated against an [`InitialCurve`], the market term
//! structure the model is fitted to.

pub mod hull_white;
pub mod risk_premium;
pub mod swaption;

pub use hull_white::HullWhiteParams;
pub use risk_premium::RiskPremiumParams;
pub use swaption::{jamshidian_payer, jamshidian_receiver, SwapSchedule};

use esg_core::types::InterpolationError;

/// Initial term structure seen by the short-rate model.
pub trait InitialCurve {
    /// Discount factor `P(0, t)`.
    fn discount(&self, t: f64) -> Result<f64, InterpolationError>;

    /// Instantaneous forward rate `f(0, t)`.
    fn forward(&self, t: f64) -> Result<f64, InterpolationError>;
}

/// Flat continuously-compounded curve, `P(0, t) = e^{-r t}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatCurve {
    rate: f64,
}

impl FlatCurve {
    /// Curve with constant instantaneous forward `rate`.
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }
}

impl InitialCurve for FlatCurve {
    fn discount(&self, t: f64) -> Result<f64, InterpolationError> {
        Ok((-self.rate * t).exp())
    }

    fn forward(&self, _t: f64) -> Result<f64, InterpolationError> {
        Ok(self.rate)
    }
}
