//! Hull-White one-factor short-rate model.
//!
//! ```text
//! dr(t) = [θ(t) - a·r(t)] dt + σ dW(t)
//! ```
//!
//! with `θ(t)` chosen so that the model reproduces the initial curve. The
//! helpers `K(t) = (1 - e^{-a t}) / a` and `L(t) = σ²/(2a)·(1 - e^{-2 a t})`
//! appear in every closed form below.
//!
//! ## Usage
//!
//! ```
//! use esg_models::models::rates::{FlatCurve, HullWhiteParams};
//!
//! let params = HullWhiteParams::new(0.05, 0.01).unwrap();
//! let curve = FlatCurve::new(0.02);
//!
//! // With r(0) on the curve the model bond price equals the market price
//! let p = params.zero_coupon_bond(&curve, 0.0, 10.0, 0.02).unwrap();
//! assert!((p - (-0.2_f64).exp()).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};

use super::InitialCurve;
use crate::analytical::norm_cdf;
use crate::models::error::{require_above, ModelError};

/// Hull-White parameters: mean reversion `a > 0` and volatility `σ > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HullWhiteParams {
    /// Mean reversion speed (a)
    pub mean_reversion: f64,
    /// Short-rate volatility (σ)
    pub volatility: f64,
}

impl HullWhiteParams {
    /// Create validated parameters.
    ///
    /// # Errors
    /// `ModelError::InvalidParameter` unless both values are finite and positive.
    ///
    /// ```
    /// use esg_models::models::rates::HullWhiteParams;
    ///
    /// assert!(HullWhiteParams::new(0.05, 0.01).is_ok());
    /// assert!(HullWhiteParams::new(-0.05, 0.01).is_err());
    /// ```
    pub fn new(mean_reversion: f64, volatility: f64) -> Result<Self, ModelError> {
        let params = Self {
            mean_reversion,
            volatility,
        };
        params.validate()?;
        Ok(params)
    }

    /// Check both parameters are finite and positive.
    pub fn validate(&self) -> Result<(), ModelError> {
        require_above("hull_white", "mean_reversion", self.mean_reversion, 0.0)?;
        require_above("hull_white", "volatility", self.volatility, 0.0)
    }

    /// `K(t) = (1 - e^{-a t}) / a`.
    #[inline]
    pub fn k(&self, t: f64) -> f64 {
        -(-self.mean_reversion * t).exp_m1() / self.mean_reversion
    }

    /// `L(t) = σ²/(2a)·(1 - e^{-2 a t})`.
    #[inline]
    pub fn l(&self, t: f64) -> f64 {
        let a = self.mean_reversion;
        self.volatility * self.volatility / (2.0 * a) * -(-2.0 * a * t).exp_m1()
    }

    /// Decay factor `e^{-a dt}` over one step.
    #[inline]
    pub fn decay(&self, dt: f64) -> f64 {
        (-self.mean_reversion * dt).exp()
    }

    /// Conditional mean of `r(t_i + dt)` given `r(t_i)`.
    ///
    /// `f_i` and `f_next` are the initial forwards at `t_i` and `t_i + dt`.
    pub fn conditional_mean(&self, t_i: f64, dt: f64, r_i: f64, f_i: f64, f_next: f64) -> f64 {
        let decay = self.decay(dt);
        let k_next = self.k(t_i + dt);
        let k_now = self.k(t_i);
        r_i * decay + f_next - f_i * decay
            + 0.5 * self.volatility * self.volatility * (k_next * k_next - decay * k_now * k_now)
    }

    /// Conditional standard deviation of the short rate over `dt`, `sqrt(L(dt))`.
    #[inline]
    pub fn step_std(&self, dt: f64) -> f64 {
        self.l(dt).sqrt()
    }

    /// Integrated rate over `[t_i, t_i + dt]` consistent with the initial curve:
    /// `-ln(P_next / P_i) + K(dt)²/2·L(t_i) - K(dt)·(f_i - r_i)`.
    ///
    /// This is `-ln P(t_i, t_i + dt | r_i)`, so summing it along a path and
    /// exponentiating gives the rolled-over one-step bond deflator.
    pub fn integrated_rate(&self, t_i: f64, dt: f64, p_i: f64, p_next: f64, f_i: f64, r_i: f64) -> f64 {
        let k_dt = self.k(dt);
        -(p_next / p_i).ln() + 0.5 * k_dt * k_dt * self.l(t_i) - k_dt * (f_i - r_i)
    }

    /// Real-world drift shift `λ·σ·(1 - e^{-a dt})/a` added to the short rate over one step.
    #[inline]
    pub fn risk_premium_shift(&self, lambda: f64, dt: f64) -> f64 {
        lambda * self.volatility * self.k(dt)
    }

    /// `B(t, T) = K(T - t)`.
    #[inline]
    pub fn bond_b(&self, t: f64, maturity: f64) -> f64 {
        self.k(maturity - t)
    }

    /// `ln A(t, T) = ln(P(0,T)/P(0,t)) + B(t,T)·f(0,t) - σ²/(4a)·(1 - e^{-2at})·B(t,T)²`.
    pub fn bond_ln_a<C: InitialCurve + ?Sized>(
        &self,
        curve: &C,
        t: f64,
        maturity: f64,
    ) -> Result<f64, ModelError> {
        let p_t = curve.discount(t)?;
        let p_maturity = curve.discount(maturity)?;
        let f_t = curve.forward(t)?;
        let b = self.bond_b(t, maturity);
        Ok((p_maturity / p_t).ln() + b * f_t - 0.5 * self.l(t) * b * b)
    }

    /// Zero-coupon bond price `P(t, T | r_t) = A(t,T)·e^{-B(t,T)·r_t}`.
    pub fn zero_coupon_bond<C: InitialCurve + ?Sized>(
        &self,
        curve: &C,
        t: f64,
        maturity: f64,
        r_t: f64,
    ) -> Result<f64, ModelError> {
        let ln_a = self.bond_ln_a(curve, t, maturity)?;
        Ok((ln_a - self.bond_b(t, maturity) * r_t).exp())
    }

    /// Volatility of `ln P(T, S)` seen from today:
    /// `σ_p = σ/a·(1 - e^{-a(S-T)})·sqrt((1 - e^{-2aT})/(2a))`.
    pub fn bond_option_vol(&self, expiry: f64, maturity: f64) -> f64 {
        self.bond_b(expiry, maturity) * self.l(expiry).sqrt()
    }

    fn bond_option_terms<C: InitialCurve + ?Sized>(
        &self,
        curve: &C,
        expiry: f64,
        maturity: f64,
        strike: f64,
    ) -> Result<(f64, f64, f64, f64), ModelError> {
        let p_expiry = curve.discount(expiry)?;
        let p_maturity = curve.discount(maturity)?;
        let sigma_p = self.bond_option_vol(expiry, maturity);
        let h = (p_maturity / (p_expiry * strike)).ln() / sigma_p + 0.5 * sigma_p;
        Ok((p_expiry, p_maturity, sigma_p, h))
    }

    /// Price at 0 of a put expiring at `expiry` on the bond maturing at `maturity`:
    /// `ZBP = X·P(0,T)·N(-h + σ_p) - P(0,S)·N(-h)`.
    pub fn zero_bond_put<C: InitialCurve + ?Sized>(
        &self,
        curve: &C,
        expiry: f64,
        maturity: f64,
        strike: f64,
    ) -> Result<f64, ModelError> {
        let (p_expiry, p_maturity, sigma_p, h) =
            self.bond_option_terms(curve, expiry, maturity, strike)?;
        Ok(strike * p_expiry * norm_cdf(-h + sigma_p) - p_maturity * norm_cdf(-h))
    }

    /// Price at 0 of a call expiring at `expiry` on the bond maturing at `maturity`:
    /// `ZBC = P(0,S)·N(h) - X·P(0,T)·N(h - σ_p)`.
    pub fn zero_bond_call<C: InitialCurve + ?Sized>(
        &self,
        curve: &C,
        expiry: f64,
        maturity: f64,
        strike: f64,
    ) -> Result<f64, ModelError> {
        let (p_expiry, p_maturity, sigma_p, h) =
            self.bond_option_terms(curve, expiry, maturity, strike)?;
        Ok(p_maturity * norm_cdf(h) - strike * p_expiry * norm_cdf(h - sigma_p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rates::FlatCurve;
    use approx::assert_relative_eq;

    fn params() -> HullWhiteParams {
        HullWhiteParams::new(0.05, 0.01).unwrap()
    }

    #[test]
    fn test_validation() {
        assert!(HullWhiteParams::new(0.0, 0.01).is_err());
        assert!(HullWhiteParams::new(0.05, -0.01).is_err());
        assert!(HullWhiteParams::new(f64::NAN, 0.01).is_err());
    }

    #[test]
    fn test_helper_functions() {
        let p = params();
        assert_relative_eq!(p.k(2.0), (1.0 - (-0.1_f64).exp()) / 0.05, epsilon = 1e-14);
        assert_relative_eq!(
            p.l(2.0),
            1e-4 / 0.1 * (1.0 - (-0.2_f64).exp()),
            epsilon = 1e-16
        );
        assert_eq!(p.k(0.0), 0.0);
        assert_eq!(p.l(0.0), 0.0);
    }

    #[test]
    fn test_conditional_mean_stays_on_convexity_adjusted_forward() {
        // E[r(t)] = f(0,t) + σ²/2·K(t)², which the recursion must preserve
        let p = params();
        let dt = 0.25;
        let mut r = 0.02;
        for i in 0..40 {
            let t = i as f64 * dt;
            r = p.conditional_mean(t, dt, r, 0.02, 0.02);
            let k = p.k(t + dt);
            assert_relative_eq!(r, 0.02 + 0.5 * 1e-4 * k * k, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_integrated_rate_matches_bond_price() {
        let p = params();
        let curve = FlatCurve::new(0.02);
        let (t, dt, r) = (3.0, 0.5, 0.035);
        let bond = p.zero_coupon_bond(&curve, t, t + dt, r).unwrap();
        let rt = p.integrated_rate(t, dt, (-0.02 * t).exp(), (-0.02 * (t + dt)).exp(), 0.02, r);
        assert_relative_eq!((-rt).exp(), bond, epsilon = 1e-14);
    }

    #[test]
    fn test_put_call_parity() {
        let p = params();
        let curve = FlatCurve::new(0.03);
        let (expiry, maturity, strike) = (2.0, 7.0, 0.87);
        let call = p.zero_bond_call(&curve, expiry, maturity, strike).unwrap();
        let put = p.zero_bond_put(&curve, expiry, maturity, strike).unwrap();
        let forward = (-0.03 * maturity).exp() - strike * (-0.03 * expiry).exp();
        assert_relative_eq!(call - put, forward, epsilon = 1e-12);
        assert!(call > 0.0 && put > 0.0);
    }

    #[test]
    fn test_risk_premium_shift() {
        let p = params();
        assert_relative_eq!(p.risk_premium_shift(0.5, 1.0), 0.5 * 0.01 * p.k(1.0));
        assert_eq!(p.risk_premium_shift(0.0, 1.0), 0.0);
    }
}
