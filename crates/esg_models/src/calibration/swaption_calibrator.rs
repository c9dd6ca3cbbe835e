//! Hull-White calibration to swaption normal volatilities.
//!
//! The search is a shrinking grid descent over `(a, σ)`. Each outer
//! iteration evaluates the `(2m + 1)²` grid centred on the current best
//! point, moves the centre to the grid minimum and halves (by default) both
//! spacings. The number of outer iterations is fixed.
//!
//! For every candidate the swaptions are priced (Jamshidian or Monte Carlo),
//! the price is divided by the annuity and inverted through the Bachelier
//! formula, and the weighted squared differences to the quoted normal
//! volatilities are summed.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use super::swaption::{ResolvedSwaption, SwaptionCalibratorConfig, SwaptionPricing, SwaptionQuote};
use super::{CalibrationDiagnostics, CalibrationError, CalibrationResult};
use crate::analytical::Bachelier;
use crate::models::rates::{jamshidian_payer, HullWhiteParams, InitialCurve};
use crate::models::ModelError;

/// Calibrates [`HullWhiteParams`] to a set of swaption quotes.
///
/// # Example
///
/// ```
/// use esg_models::calibration::{SwaptionCalibrator, SwaptionCalibratorConfig, SwaptionQuote};
/// use esg_models::models::rates::FlatCurve;
///
/// let quotes = vec![
///     SwaptionQuote::atm(1.0, 5.0, 0.0097),
///     SwaptionQuote::atm(5.0, 5.0, 0.0084),
///     SwaptionQuote::atm(10.0, 10.0, 0.0060),
/// ];
/// let calibrator = SwaptionCalibrator::new(SwaptionCalibratorConfig::default()).unwrap();
/// let result = calibrator.calibrate(&FlatCurve::new(0.02), &quotes).unwrap();
/// assert!(result.params().mean_reversion > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwaptionCalibrator {
    config: SwaptionCalibratorConfig,
}

impl SwaptionCalibrator {
    /// Create a calibrator with validated settings.
    pub fn new(config: SwaptionCalibratorConfig) -> Result<Self, CalibrationError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Calibrator with default settings.
    pub fn with_defaults() -> Self {
        Self {
            config: SwaptionCalibratorConfig::default(),
        }
    }

    /// Settings.
    pub fn config(&self) -> &SwaptionCalibratorConfig {
        &self.config
    }

    /// Fit `(a, σ)` to `quotes` priced off `curve`.
    ///
    /// # Errors
    /// - `InsufficientData` for an empty quote set
    /// - `InvalidMarketData` for a malformed quote
    /// - `ZeroTotalWeight` when no quote falls within `liquid_count`
    /// - `NumericalInstability` when no candidate prices every weighted quote
    pub fn calibrate<C: InitialCurve + ?Sized>(
        &self,
        curve: &C,
        quotes: &[SwaptionQuote],
    ) -> Result<CalibrationResult<HullWhiteParams>, CalibrationError> {
        let started = Instant::now();
        if quotes.is_empty() {
            return Err(CalibrationError::insufficient_data(1, 0));
        }
        let weights: Vec<f64> = (0..quotes.len()).map(|i| self.config.weight(i)).collect();
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(CalibrationError::ZeroTotalWeight {
                quotes: quotes.len(),
                liquid_count: self.config.liquid_count,
            });
        }

        let mut instruments = Vec::with_capacity(quotes.len());
        for (i, quote) in quotes.iter().enumerate() {
            quote.validate(i)?;
            let resolved = quote.resolve(curve)?;
            let normals = match self.config.pricing {
                SwaptionPricing::Analytic => Vec::new(),
                SwaptionPricing::MonteCarlo { paths, dt, seed } => {
                    draw_normals(paths, steps_to(resolved.schedule.expiry(), dt), seed.wrapping_add(i as u64))
                }
            };
            instruments.push(Instrument { resolved, normals });
        }

        let cfg = &self.config;
        let mut evaluations = 0usize;
        let mut objective = |a: f64, sigma: f64| -> f64 {
            evaluations += 1;
            let params = HullWhiteParams {
                mean_reversion: a,
                volatility: sigma,
            };
            let mut error = 0.0;
            for (instrument, &w) in instruments.iter().zip(&weights) {
                if w <= 0.0 {
                    continue;
                }
                match self.model_vol(&params, curve, instrument) {
                    Ok(vol) => error += w * (vol - instrument.resolved.market_vol).powi(2),
                    Err(_) => return f64::INFINITY,
                }
            }
            error
        };

        let (mut centre_a, mut centre_sigma) = (cfg.initial_mean_reversion, cfg.initial_volatility);
        let (mut step_a, mut step_sigma) = (cfg.mean_reversion_step, cfg.volatility_step);
        let mut best = objective(centre_a, centre_sigma);
        let half = cfg.grid_half_width as i64;

        for iteration in 0..cfg.outer_iterations {
            let (mut best_a, mut best_sigma) = (centre_a, centre_sigma);
            for i in -half..=half {
                for j in -half..=half {
                    if i == 0 && j == 0 {
                        continue;
                    }
                    let a = centre_a + i as f64 * step_a;
                    let sigma = centre_sigma + j as f64 * step_sigma;
                    if a <= cfg.min_mean_reversion || sigma <= cfg.min_volatility {
                        continue;
                    }
                    let error = objective(a, sigma);
                    if error < best {
                        best = error;
                        best_a = a;
                        best_sigma = sigma;
                    }
                }
            }
            centre_a = best_a;
            centre_sigma = best_sigma;
            step_a *= cfg.shrink_factor;
            step_sigma *= cfg.shrink_factor;
            tracing::debug!(
                iteration,
                mean_reversion = centre_a,
                volatility = centre_sigma,
                error = best,
                "swaption grid iteration"
            );
        }

        if !best.is_finite() {
            return Err(CalibrationError::numerical_instability(
                "no candidate parameters priced every weighted swaption",
            ));
        }

        let params = HullWhiteParams::new(centre_a, centre_sigma)?;
        let errors: Vec<f64> = instruments
            .iter()
            .map(|instrument| {
                self.model_vol(&params, curve, instrument)
                    .map_or(f64::NAN, |vol| vol - instrument.resolved.market_vol)
            })
            .collect();
        let diagnostics = CalibrationDiagnostics::new(cfg.outer_iterations, evaluations, best, started.elapsed())
            .with_instrument_errors(errors, &weights);

        tracing::info!(
            mean_reversion = params.mean_reversion,
            volatility = params.volatility,
            rmse = diagnostics.rmse,
            evaluations = diagnostics.evaluations,
            "Hull-White calibrated to {} swaptions",
            quotes.len()
        );
        Ok(CalibrationResult::new(params, diagnostics))
    }

    /// Normal volatility implied by the model price of one swaption.
    fn model_vol<C: InitialCurve + ?Sized>(
        &self,
        params: &HullWhiteParams,
        curve: &C,
        instrument: &Instrument,
    ) -> Result<f64, CalibrationError> {
        let swaption = &instrument.resolved;
        let price = match self.config.pricing {
            SwaptionPricing::Analytic => {
                jamshidian_payer(params, curve, &swaption.schedule, swaption.strike)?
            }
            SwaptionPricing::MonteCarlo { dt, .. } => {
                monte_carlo_payer(params, curve, swaption, dt, &instrument.normals)?
            }
        };
        Bachelier::implied_volatility(
            price / swaption.annuity,
            swaption.forward,
            swaption.strike,
            swaption.schedule.expiry(),
            true,
        )
        .map_err(|e| CalibrationError::numerical_instability(e.to_string()))
    }
}

/// Resolved quote with its pre-drawn Monte Carlo normals.
struct Instrument {
    resolved: ResolvedSwaption,
    normals: Vec<f64>,
}

fn steps_to(expiry: f64, dt: f64) -> usize {
    ((expiry / dt).round() as usize).max(1)
}

/// `ceil(paths / 2) · steps` standard normals; each row drives a pair of
/// antithetic paths.
fn draw_normals(paths: usize, steps: usize, seed: u64) -> Vec<f64> {
    let pairs = paths.div_ceil(2);
    let mut rng = StdRng::seed_from_u64(seed);
    (0..pairs * steps).map(|_| StandardNormal.sample(&mut rng)).collect()
}

/// Payer swaption price by simulating the short rate to expiry with the exact
/// Gaussian transition and discounting with the integrated rate.
///
/// The same normals are reused for every candidate so the objective is smooth
/// in the parameters.
fn monte_carlo_payer<C: InitialCurve + ?Sized>(
    params: &HullWhiteParams,
    curve: &C,
    swaption: &ResolvedSwaption,
    dt: f64,
    normals: &[f64],
) -> Result<f64, ModelError> {
    let expiry = swaption.schedule.expiry();
    let steps = steps_to(expiry, dt);
    let h = expiry / steps as f64;

    let mut discounts = Vec::with_capacity(steps + 1);
    let mut forwards = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let t = i as f64 * h;
        discounts.push(curve.discount(t)?);
        forwards.push(curve.forward(t)?);
    }
    let std = params.step_std(h);

    let mut total = 0.0;
    let mut count = 0usize;
    for row in normals.chunks_exact(steps) {
        for sign in [1.0, -1.0] {
            let mut r = forwards[0];
            let mut integrated = 0.0;
            for (i, z) in row.iter().enumerate() {
                let t = i as f64 * h;
                integrated += params.integrated_rate(t, h, discounts[i], discounts[i + 1], forwards[i], r);
                r = params.conditional_mean(t, h, r, forwards[i], forwards[i + 1]) + std * sign * z;
            }
            let payoff = swaption
                .schedule
                .payer_exercise_value(params, curve, swaption.strike, r)?;
            total += (-integrated).exp() * payoff;
            count += 1;
        }
    }
    Ok(total / count.max(1) as f64)
}
