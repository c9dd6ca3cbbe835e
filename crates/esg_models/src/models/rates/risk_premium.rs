//! Market price of interest rate risk.
//!
//! `λ(t)` follows an Ornstein-Uhlenbeck process
//!
//! ```text
//! dλ = κ·(λ̄ - λ) dt + η dW
//! ```
//!
//! simulated with its exact transition. The real-world short rate adds
//! `λ·σ·K(dt)` to the risk-neutral drift at each step.

use serde::{Deserialize, Serialize};

use crate::models::error::{require_above, ModelError};

/// Risk premium process parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPremiumParams {
    /// λ(0)
    pub initial: f64,
    /// Long-run level λ̄
    pub long_run: f64,
    /// Mean reversion speed κ (> 0)
    pub speed: f64,
    /// Volatility η (>= 0)
    pub volatility: f64,
}

impl Default for RiskPremiumParams {
    fn default() -> Self {
        Self {
            initial: 0.0,
            long_run: 0.0,
            speed: 0.5,
            volatility: 0.1,
        }
    }
}

impl RiskPremiumParams {
    /// Check every parameter is finite, `κ > 0` and `η >= 0`.
    pub fn validate(&self) -> Result<(), ModelError> {
        require_above("risk_premium", "speed", self.speed, 0.0)?;
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(ModelError::invalid_parameter(
                "risk_premium",
                "volatility",
                self.volatility,
            ));
        }
        for (name, value) in [("initial", self.initial), ("long_run", self.long_run)] {
            if !value.is_finite() {
                return Err(ModelError::invalid_parameter("risk_premium", name, value));
            }
        }
        Ok(())
    }

    /// Process switched off: λ stays at zero.
    pub fn zero() -> Self {
        Self {
            initial: 0.0,
            long_run: 0.0,
            volatility: 0.0,
            ..Self::default()
        }
    }

    /// Standard deviation of one exact step, `η·sqrt((1 - e^{-2κ dt})/(2κ))`.
    pub fn step_std(&self, dt: f64) -> f64 {
        let kappa = self.speed;
        self.volatility * (-(-2.0 * kappa * dt).exp_m1() / (2.0 * kappa)).sqrt()
    }

    /// One exact step from `lambda` with standard normal draw `z`.
    #[inline]
    pub fn step(&self, lambda: f64, dt: f64, z: f64) -> f64 {
        let decay = (-self.speed * dt).exp();
        lambda * decay + self.long_run * (1.0 - decay) + self.step_std(dt) * z
    }

    /// Mean of λ(t) seen from λ(0).
    pub fn mean(&self, t: f64) -> f64 {
        let decay = (-self.speed * t).exp();
        self.initial * decay + self.long_run * (1.0 - decay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_are_valid() {
        let params = RiskPremiumParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.speed, 0.5);
        assert_eq!(params.volatility, 0.1);
    }

    #[test]
    fn test_validation() {
        let bad_speed = RiskPremiumParams {
            speed: 0.0,
            ..Default::default()
        };
        assert!(bad_speed.validate().is_err());
        let bad_vol = RiskPremiumParams {
            volatility: -0.1,
            ..Default::default()
        };
        assert!(bad_vol.validate().is_err());
    }

    #[test]
    fn test_deterministic_step_follows_mean() {
        let params = RiskPremiumParams {
            initial: 0.3,
            long_run: 0.1,
            speed: 0.7,
            volatility: 0.2,
        };
        let dt = 0.1;
        let mut lambda = params.initial;
        for i in 1..=50 {
            lambda = params.step(lambda, dt, 0.0);
            assert_relative_eq!(lambda, params.mean(i as f64 * dt), epsilon = 1e-13);
        }
    }

    #[test]
    fn test_step_std_limit() {
        let params = RiskPremiumParams::default();
        // Small steps behave like Brownian increments
        assert_relative_eq!(params.step_std(1e-6), 0.1 * 1e-3, max_relative = 1e-5);
        assert_eq!(RiskPremiumParams::zero().step_std(1.0), 0.0);
    }
}
