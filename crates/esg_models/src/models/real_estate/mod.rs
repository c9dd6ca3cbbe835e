//! Real-estate returns driven by an auxiliary mean-reverting rate.
//!
//! The auxiliary rate `r2` reverts to the initial forward curve:
//!
//! ```text
//! r2[i+1] = r2[i]·e^{-a2 dt} + f0t[i]·(1 - e^{-a2 dt}) + σ2·sqrt(K2a)·z_infl
//! ```
//!
//! and the price log-return over step `i` is
//!
//! ```text
//! k_i·dt + (r2[i] - f0t[i])·K2 + η2·z_re
//! ```
//!
//! with `K2 = (1 - e^{-a2 dt})/a2`, `K2a = (1 - e^{-2 a2 dt})/(2 a2)` and
//! `η2 = (σ2/a2)·sqrt(dt - 2·K2 + K2a)`. The drift `k_i` is not a parameter:
//! [`RealEstateParams::solve_drift`] solves it at every step so that the
//! expected total return (price plus rent) equals the curve's one-step
//! return `P0t[i]/P0t[i+1]` times `e^{ρ dt}`, using the exact mean and
//! variance of `r2[i]`.

use serde::{Deserialize, Serialize};

use crate::models::error::{require_above, require_within, ModelError};

/// Real-estate model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealEstateParams {
    /// Auxiliary rate mean reversion a2
    pub mean_reversion: f64,
    /// Auxiliary rate volatility σ2
    pub volatility: f64,
    /// Annual rental yield y (simple rate)
    pub rental_yield: f64,
    /// Annual growth g of the rental log-yield per elapsed year
    pub rental_growth: f64,
    /// Annual excess return ρ in the real-world measure
    pub risk_premium: f64,
}

impl Default for RealEstateParams {
    fn default() -> Self {
        Self {
            mean_reversion: 0.15,
            volatility: 0.10,
            rental_yield: 0.035,
            rental_growth: 0.0,
            risk_premium: 0.02,
        }
    }
}

/// Step coefficients shared by every path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealEstateCoefficients {
    /// `e^{-a2 dt}`
    pub decay: f64,
    /// `K2`
    pub k2: f64,
    /// `K2a`
    pub k2a: f64,
    /// Price shock loading `η2`
    pub eta2: f64,
    /// Auxiliary rate shock loading `σ2·sqrt(K2a)`
    pub aux_std: f64,
}

/// Vacancy and operating costs of a let commercial property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommercialLease {
    /// Gross rental yield before vacancy and expenses
    pub gross_yield: f64,
    /// Expected vacancy rate
    pub vacancy_rate: f64,
    /// Operating expenses as a fraction of collected rent
    pub operating_expense_ratio: f64,
}

/// Income statement of a commercial property for one year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetOperatingIncome {
    /// Gross potential rent
    pub gross_income: f64,
    /// Operating expenses on collected rent
    pub operating_expenses: f64,
    /// Net operating income
    pub noi: f64,
}

impl Default for CommercialLease {
    fn default() -> Self {
        Self {
            gross_yield: 0.06,
            vacancy_rate: 0.05,
            operating_expense_ratio: 0.30,
        }
    }
}

impl CommercialLease {
    /// Net yield `y·(1 - vacancy)·(1 - opex)`.
    pub fn net_yield(&self) -> f64 {
        self.gross_yield * (1.0 - self.vacancy_rate) * (1.0 - self.operating_expense_ratio)
    }

    /// Income statement for a property worth `value`.
    pub fn operating_income(&self, value: f64) -> NetOperatingIncome {
        let gross_income = value * self.gross_yield;
        let collected = gross_income * (1.0 - self.vacancy_rate);
        let operating_expenses = collected * self.operating_expense_ratio;
        NetOperatingIncome {
            gross_income,
            operating_expenses,
            noi: collected - operating_expenses,
        }
    }
}

impl RealEstateParams {
    /// Urban residential preset.
    pub fn urban() -> Self {
        Self::residential(0.15, 0.12, 0.035)
    }

    /// Suburban residential preset.
    pub fn suburban() -> Self {
        Self::residential(0.12, 0.10, 0.040)
    }

    /// Rural residential preset.
    pub fn rural() -> Self {
        Self::residential(0.10, 0.08, 0.045)
    }

    fn residential(mean_reversion: f64, volatility: f64, rental_yield: f64) -> Self {
        Self {
            mean_reversion,
            volatility,
            rental_yield,
            rental_growth: 0.02,
            ..Self::default()
        }
    }

    /// Commercial property earning the lease's net yield.
    pub fn commercial(mean_reversion: f64, volatility: f64, lease: &CommercialLease) -> Self {
        Self {
            mean_reversion,
            volatility,
            rental_yield: lease.net_yield(),
            rental_growth: 0.02,
            ..Self::default()
        }
    }

    /// Check `a2 > 0`, `σ2 > 0`, `y` in `[0, 1)` and finite growth and premium.
    pub fn validate(&self) -> Result<(), ModelError> {
        require_above("real_estate", "mean_reversion", self.mean_reversion, 0.0)?;
        require_above("real_estate", "volatility", self.volatility, 0.0)?;
        require_within("real_estate", "rental_yield", self.rental_yield, 0.0, 0.999_999)?;
        for (name, value) in [
            ("rental_growth", self.rental_growth),
            ("risk_premium", self.risk_premium),
        ] {
            if !value.is_finite() {
                return Err(ModelError::invalid_parameter("real_estate", name, value));
            }
        }
        Ok(())
    }

    /// Coefficients for step size `dt`.
    pub fn coefficients(&self, dt: f64) -> RealEstateCoefficients {
        let a = self.mean_reversion;
        let decay = (-a * dt).exp();
        let k2 = -(-a * dt).exp_m1() / a;
        let k2a = -(-2.0 * a * dt).exp_m1() / (2.0 * a);
        let eta2 = (self.volatility / a) * (dt - 2.0 * k2 + k2a).max(0.0).sqrt();
        RealEstateCoefficients {
            decay,
            k2,
            k2a,
            eta2,
            aux_std: self.volatility * k2a.sqrt(),
        }
    }

    /// Rental log-return over step `i`: `(ln(1 + y) + g·t_i)·dt` with `t_i = i·dt`.
    #[inline]
    pub fn rental_return(&self, step: usize, dt: f64) -> f64 {
        (self.rental_yield.ln_1p() + self.rental_growth * step as f64 * dt) * dt
    }

    /// Drift `k_i` for each step `i` in `0..p0t.len() - 1`.
    ///
    /// `p0t` and `f0t` are the initial discount factors and forwards on the
    /// step grid. `real_world` adds the risk premium ρ to the target return.
    ///
    /// # Errors
    /// `InvalidParameter` when the grids differ in length or hold fewer than two points.
    pub fn solve_drift(
        &self,
        dt: f64,
        p0t: &[f64],
        f0t: &[f64],
        real_world: bool,
    ) -> Result<Vec<f64>, ModelError> {
        if p0t.len() != f0t.len() || p0t.len() < 2 {
            return Err(ModelError::invalid_parameter(
                "real_estate",
                "grid_length",
                p0t.len() as f64,
            ));
        }
        let coeff = self.coefficients(dt);
        let premium = if real_world { self.risk_premium } else { 0.0 };
        let sigma2 = self.volatility * self.volatility;

        let n_steps = p0t.len() - 1;
        let mut drift = Vec::with_capacity(n_steps);
        let (mut mean, mut variance) = (f0t[0], 0.0);
        for i in 0..n_steps {
            let y = -(p0t[i + 1] / p0t[i]).ln();
            let k = (y + premium * dt
                - self.rental_return(i, dt)
                - (mean - f0t[i]) * coeff.k2
                - 0.5 * coeff.k2 * coeff.k2 * variance
                - 0.5 * coeff.eta2 * coeff.eta2)
                / dt;
            drift.push(k);
            mean = mean * coeff.decay + f0t[i] * (1.0 - coeff.decay);
            variance = variance * coeff.decay * coeff.decay + sigma2 * coeff.k2a;
        }
        Ok(drift)
    }
}

impl RealEstateCoefficients {
    /// Next auxiliary rate from `r2` with inflation shock `z`.
    #[inline]
    pub fn aux_step(&self, r2: f64, f_i: f64, z: f64) -> f64 {
        r2 * self.decay + f_i * (1.0 - self.decay) + self.aux_std * z
    }

    /// Price log-return over a step with drift `k`, current auxiliary rate
    /// `r2`, forward `f_i` and real-estate shock `z`.
    #[inline]
    pub fn price_return(&self, k: f64, dt: f64, r2: f64, f_i: f64, z: f64) -> f64 {
        k * dt + (r2 - f_i) * self.k2 + self.eta2 * z
    }
}

/// Capitalisation rate: net operating income over property value.
pub fn cap_rate(net_operating_income: f64, property_value: f64) -> f64 {
    net_operating_income / property_value
}

/// Price-to-rent ratio.
pub fn price_to_rent(property_value: f64, annual_rent: f64) -> f64 {
    property_value / annual_rent
}
