//! Parameter estimates from historical series.
//!
//! Moments use the population standard deviation (divisor `n`). Series too
//! short to define a moment are rejected with `InsufficientData`.

use esg_core::math::statistics;
use serde::{Deserialize, Serialize};

use super::error::CalibrationError;
use crate::models::real_estate::RealEstateParams;

/// Mean reversion used when the lag-one autocorrelation is undefined.
pub const DEFAULT_MEAN_REVERSION: f64 = 0.1;

/// Admissible range of the estimated mean reversion.
pub const MEAN_REVERSION_BOUNDS: (f64, f64) = (0.05, 0.5);

/// Autocorrelation floor applied before taking the logarithm.
const MIN_AUTOCORRELATION: f64 = 0.01;

/// Real-estate parameters fitted to a price index and its rents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealEstateEstimate {
    /// `-ln(max(ρ₁, 0.01)) / dt`, clamped to [`MEAN_REVERSION_BOUNDS`]
    pub mean_reversion: f64,
    /// Std of the log-price returns over `sqrt(dt)`
    pub volatility: f64,
    /// Mean of `rent / price`
    pub rental_yield: f64,
}

impl RealEstateEstimate {
    /// `base` with the fitted mean reversion, volatility and rental yield.
    pub fn apply(&self, base: RealEstateParams) -> RealEstateParams {
        RealEstateParams {
            mean_reversion: self.mean_reversion,
            volatility: self.volatility,
            rental_yield: self.rental_yield,
            ..base
        }
    }
}

/// Fit real-estate parameters to `prices` and `rents` observed every `dt` years.
///
/// With a single return, or returns whose autocorrelation is undefined, the
/// mean reversion falls back to [`DEFAULT_MEAN_REVERSION`].
///
/// # Errors
/// - `InsufficientData` for fewer than two prices
/// - `InvalidMarketData` for mismatched lengths, non-positive prices or
///   negative rents
/// - `InvalidSettings` for a non-positive `dt`
pub fn calibrate_real_estate(
    prices: &[f64],
    rents: &[f64],
    dt: f64,
) -> Result<RealEstateEstimate, CalibrationError> {
    if prices.len() < 2 {
        return Err(CalibrationError::insufficient_data(2, prices.len()));
    }
    if rents.len() != prices.len() {
        return Err(CalibrationError::invalid_market_data(format!(
            "{} rents for {} prices",
            rents.len(),
            prices.len()
        )));
    }
    if !(dt.is_finite() && dt > 0.0) {
        return Err(CalibrationError::invalid_settings(format!(
            "observation step must be positive, got {dt}"
        )));
    }
    if let Some((index, price)) = prices
        .iter()
        .enumerate()
        .find(|(_, p)| !(p.is_finite() && **p > 0.0))
    {
        return Err(CalibrationError::invalid_market_data(format!(
            "price {price} at index {index} is not positive"
        )));
    }
    if let Some((index, rent)) = rents
        .iter()
        .enumerate()
        .find(|(_, r)| !(r.is_finite() && **r >= 0.0))
    {
        return Err(CalibrationError::invalid_market_data(format!(
            "rent {rent} at index {index} is negative"
        )));
    }

    let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    let volatility = statistics::population_std_dev(&returns)
        .ok_or_else(|| CalibrationError::insufficient_data(1, 0))?
        / dt.sqrt();

    let (lo, hi) = MEAN_REVERSION_BOUNDS;
    let mean_reversion = match statistics::correlation(&returns[..returns.len() - 1], &returns[1..]) {
        Some(rho) => (-rho.max(MIN_AUTOCORRELATION).ln() / dt).clamp(lo, hi),
        None => DEFAULT_MEAN_REVERSION,
    };

    let yields: Vec<f64> = rents.iter().zip(prices).map(|(r, p)| r / p).collect();
    let rental_yield = statistics::mean(&yields)
        .ok_or_else(|| CalibrationError::insufficient_data(1, 0))?;

    tracing::debug!(
        observations = prices.len(),
        mean_reversion,
        volatility,
        rental_yield,
        "fitted real estate parameters to history"
    );

    Ok(RealEstateEstimate {
        mean_reversion,
        volatility,
        rental_yield,
    })
}

/// Volatility of historical equity returns, annualised by `sqrt(periods_per_year)`.
///
/// Pass `1.0` for annual returns, `12.0` for monthly, `252.0` for daily.
///
/// # Errors
/// - `InsufficientData` for fewer than two returns
/// - `InvalidMarketData` for a non-finite return
/// - `InvalidSettings` for a non-positive `periods_per_year`
pub fn equity_volatility(returns: &[f64], periods_per_year: f64) -> Result<f64, CalibrationError> {
    check_returns(returns)?;
    if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return Err(CalibrationError::invalid_settings(format!(
            "periods per year must be positive, got {periods_per_year}"
        )));
    }
    let vol = statistics::population_std_dev(returns)
        .ok_or_else(|| CalibrationError::insufficient_data(2, returns.len()))?;
    Ok(vol * periods_per_year.sqrt())
}

/// Sharpe ratio `mean(r - rf) / std(r - rf)` per observation period.
///
/// # Errors
/// - `InsufficientData` for fewer than two returns
/// - `InvalidMarketData` for a non-finite return
/// - `NumericalInstability` when the excess returns do not vary
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> Result<f64, CalibrationError> {
    check_returns(returns)?;
    let excess: Vec<f64> = returns.iter().map(|r| r - risk_free_rate).collect();
    let mean = statistics::mean(&excess)
        .ok_or_else(|| CalibrationError::insufficient_data(2, returns.len()))?;
    let std = statistics::population_std_dev(&excess)
        .ok_or_else(|| CalibrationError::insufficient_data(2, returns.len()))?;
    if !(std > 0.0) {
        return Err(CalibrationError::numerical_instability(
            "excess returns have zero dispersion",
        ));
    }
    Ok(mean / std)
}

fn check_returns(returns: &[f64]) -> Result<(), CalibrationError> {
    if returns.len() < 2 {
        return Err(CalibrationError::insufficient_data(2, returns.len()));
    }
    if let Some((index, r)) = returns.iter().enumerate().find(|(_, r)| !r.is_finite()) {
        return Err(CalibrationError::invalid_market_data(format!(
            "return {r} at index {index} is not finite"
        )));
    }
    Ok(())
}
