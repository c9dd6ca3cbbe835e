//! Equity index returns.
//!
//! Over a step `[t_i, t_i + dt]` the total log-return is
//!
//! ```text
//! R_i - ½σ²·dt + μ·dt + σ·sqrt(dt)·ε
//! ```
//!
//! where `R_i` is the integrated short rate over the step (it already carries
//! the Hull-White convexity term), `μ` the equity risk premium (zero in the
//! risk-neutral measure) and `ε` the correlated equity shock. The dividend
//! return is the deterministic `ln(1 + q)·dt` and the price return is the
//! remainder.
//!
//! [`DividendGrowthModel`] relates a dividend yield to a fair value under
//! constant dividend growth.

use serde::{Deserialize, Serialize};

use crate::models::error::{require_above, require_within, ModelError};

/// Equity model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquityParams {
    /// Annual volatility σ
    pub volatility: f64,
    /// Annual dividend yield q (simple rate)
    pub dividend_yield: f64,
    /// Annual excess return μ added in the real-world measure
    pub risk_premium: f64,
}

impl Default for EquityParams {
    fn default() -> Self {
        Self {
            volatility: 0.18,
            dividend_yield: 0.02,
            risk_premium: 0.04,
        }
    }
}

/// Split of one step's equity log-return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityStep {
    /// Total return (price plus dividend)
    pub total: f64,
    /// Price return
    pub price: f64,
    /// Dividend return
    pub dividend: f64,
}

impl EquityParams {
    /// Check `σ > 0`, `q` in `[0, 1)` and a finite risk premium.
    pub fn validate(&self) -> Result<(), ModelError> {
        require_above("equity", "volatility", self.volatility, 0.0)?;
        require_within("equity", "dividend_yield", self.dividend_yield, 0.0, 0.999_999)?;
        if !self.risk_premium.is_finite() {
            return Err(ModelError::invalid_parameter(
                "equity",
                "risk_premium",
                self.risk_premium,
            ));
        }
        Ok(())
    }

    /// Dividend log-return over `dt`.
    #[inline]
    pub fn dividend_return(&self, dt: f64) -> f64 {
        self.dividend_yield.ln_1p() * dt
    }

    /// Returns over one step given the integrated rate and equity shock.
    pub fn step(&self, integrated_rate: f64, dt: f64, shock: f64, real_world: bool) -> EquityStep {
        let premium = if real_world { self.risk_premium } else { 0.0 };
        let sigma = self.volatility;
        let total = integrated_rate - 0.5 * sigma * sigma * dt + premium * dt + sigma * dt.sqrt() * shock;
        let dividend = self.dividend_return(dt);
        EquityStep {
            total,
            price: total - dividend,
            dividend,
        }
    }
}

/// Price index path from a series of log-returns.
///
/// `returns[0]` is the empty step at `t = 0`; `prices[k] = S0·exp(Σ_{j<=k} returns[j])`.
pub fn simulate_prices(returns: &[f64], initial_price: f64) -> Vec<f64> {
    returns
        .iter()
        .scan(0.0, |cumulative, r| {
            *cumulative += r;
            Some(initial_price * cumulative.exp())
        })
        .collect()
}

/// Largest peak-to-trough fall of a price path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drawdown {
    /// Relative fall `(trough - peak) / peak`, zero or negative
    pub depth: f64,
    /// Index of the peak
    pub peak: usize,
    /// Index of the trough
    pub trough: usize,
}

/// Maximum drawdown of a price path; `None` for an empty path.
pub fn max_drawdown(prices: &[f64]) -> Option<Drawdown> {
    let first = *prices.first()?;
    let mut best = Drawdown {
        depth: 0.0,
        peak: 0,
        trough: 0,
    };
    let (mut peak_value, mut peak_index) = (first, 0);
    for (i, &p) in prices.iter().enumerate() {
        if p > peak_value {
            peak_value = p;
            peak_index = i;
        }
        let depth = (p - peak_value) / peak_value;
        if depth < best.depth {
            best = Drawdown {
                depth,
                peak: peak_index,
                trough: i,
            };
        }
    }
    Some(best)
}

/// Constant dividend growth (Gordon) valuation `P = D / (r - g)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DividendGrowthModel {
    dividend: f64,
    growth_rate: f64,
    required_return: f64,
}

impl DividendGrowthModel {
    /// Model with current dividend `D`, growth `g` and required return `r`.
    ///
    /// # Errors
    /// `InvalidParameter` for a negative dividend, a non-finite rate or `g >= r`.
    pub fn new(dividend: f64, growth_rate: f64, required_return: f64) -> Result<Self, ModelError> {
        require_within("dividend_growth", "dividend", dividend, 0.0, f64::MAX)?;
        require_above("dividend_growth", "required_return", required_return, -1.0)?;
        if !(growth_rate.is_finite() && growth_rate < required_return) {
            return Err(ModelError::invalid_parameter(
                "dividend_growth",
                "growth_rate",
                growth_rate,
            ));
        }
        Ok(Self {
            dividend,
            growth_rate,
            required_return,
        })
    }

    /// Fair value `D / (r - g)`.
    pub fn fair_value(&self) -> f64 {
        self.dividend / (self.required_return - self.growth_rate)
    }

    /// Dividend yield at fair value, `r - g`.
    pub fn dividend_yield(&self) -> f64 {
        self.required_return - self.growth_rate
    }

    /// Dividends `D·(1 + g)^k` for years `k = 0..n_years`.
    pub fn project_dividends(&self, n_years: usize) -> Vec<f64> {
        (0..n_years)
            .scan(self.dividend, |dividend, _| {
                let current = *dividend;
                *dividend *= 1.0 + self.growth_rate;
                Some(current)
            })
            .collect()
    }
}
