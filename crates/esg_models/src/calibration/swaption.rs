//! Swaption market quotes and calibration settings.

use serde::{Deserialize, Serialize};

use super::CalibrationError;
use crate::models::rates::{InitialCurve, SwapSchedule};

/// Market quote of a European payer swaption in normal volatility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwaptionQuote {
    /// Option expiry in years
    pub expiry: f64,
    /// Underlying swap tenor in years
    pub tenor: f64,
    /// Fixed-leg payments per year
    #[serde(default = "default_frequency")]
    pub frequency: u32,
    /// Absolute strike; `None` means at the money
    #[serde(default)]
    pub strike: Option<f64>,
    /// Quoted normal (Bachelier) volatility
    pub normal_vol: f64,
}

fn default_frequency() -> u32 {
    1
}

impl SwaptionQuote {
    /// At-the-money quote with an annual fixed leg.
    pub fn atm(expiry: f64, tenor: f64, normal_vol: f64) -> Self {
        Self {
            expiry,
            tenor,
            frequency: 1,
            strike: None,
            normal_vol,
        }
    }

    /// Set an absolute strike.
    pub fn with_strike(mut self, strike: f64) -> Self {
        self.strike = Some(strike);
        self
    }

    /// Set the fixed-leg frequency.
    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = frequency;
        self
    }

    /// Check the quote; `index` is reported in the error.
    pub fn validate(&self, index: usize) -> Result<(), CalibrationError> {
        let fail = |what: String| {
            Err(CalibrationError::invalid_market_data(format!(
                "swaption quote {index}: {what}"
            )))
        };
        if !(self.expiry.is_finite() && self.expiry > 0.0) {
            return fail(format!("expiry must be positive, got {}", self.expiry));
        }
        if !(self.tenor.is_finite() && self.tenor > 0.0) {
            return fail(format!("tenor must be positive, got {}", self.tenor));
        }
        if self.frequency == 0 {
            return fail("frequency must be at least one payment per year".to_string());
        }
        if !(self.normal_vol.is_finite() && self.normal_vol > 0.0) {
            return fail(format!("normal volatility must be positive, got {}", self.normal_vol));
        }
        if let Some(strike) = self.strike {
            if !strike.is_finite() {
                return fail(format!("strike must be finite, got {strike}"));
            }
        }
        Ok(())
    }

    /// Fixed-leg schedule of the underlying swap.
    pub fn schedule(&self) -> Result<SwapSchedule, CalibrationError> {
        Ok(SwapSchedule::new(self.expiry, self.tenor, self.frequency)?)
    }

    /// Quote resolved against a curve: schedule, annuity, forward and strike.
    pub fn resolve<C: InitialCurve + ?Sized>(
        &self,
        curve: &C,
    ) -> Result<ResolvedSwaption, CalibrationError> {
        let schedule = self.schedule()?;
        let annuity = schedule.annuity(curve)?;
        let forward = schedule.forward_rate(curve)?;
        Ok(ResolvedSwaption {
            strike: self.strike.unwrap_or(forward),
            schedule,
            annuity,
            forward,
            market_vol: self.normal_vol,
        })
    }
}

/// Swaption quote with its curve-dependent quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSwaption {
    /// Fixed-leg schedule
    pub schedule: SwapSchedule,
    /// Annuity `Σ τ·P(0, S_i)`
    pub annuity: f64,
    /// Forward swap rate
    pub forward: f64,
    /// Absolute strike (the forward for ATM quotes)
    pub strike: f64,
    /// Quoted normal volatility
    pub market_vol: f64,
}

/// How candidate parameters price the swaptions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SwaptionPricing {
    /// Jamshidian decomposition
    Analytic,
    /// Antithetic Monte Carlo on the exact short-rate transition
    MonteCarlo {
        /// Number of paths (rounded up to an even number)
        paths: usize,
        /// Simulation step in years
        dt: f64,
        /// Base seed; quote `i` uses `seed + i`
        seed: u64,
    },
}

impl Default for SwaptionPricing {
    fn default() -> Self {
        SwaptionPricing::Analytic
    }
}

/// Grid descent settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwaptionCalibratorConfig {
    /// Starting mean reversion
    pub initial_mean_reversion: f64,
    /// Starting volatility
    pub initial_volatility: f64,
    /// Initial grid spacing in mean reversion
    pub mean_reversion_step: f64,
    /// Initial grid spacing in volatility
    pub volatility_step: f64,
    /// Grid points on each side of the centre
    pub grid_half_width: usize,
    /// Factor applied to both spacings after each outer iteration
    pub shrink_factor: f64,
    /// Number of outer iterations
    pub outer_iterations: usize,
    /// Candidates with mean reversion at or below this are skipped
    pub min_mean_reversion: f64,
    /// Candidates with volatility at or below this are skipped
    pub min_volatility: f64,
    /// Leading quotes given unit weight, the rest weigh zero
    pub liquid_count: usize,
    /// Pricing method
    pub pricing: SwaptionPricing,
}

impl Default for SwaptionCalibratorConfig {
    fn default() -> Self {
        Self {
            initial_mean_reversion: 0.05,
            initial_volatility: 0.01,
            mean_reversion_step: 0.02,
            volatility_step: 0.004,
            grid_half_width: 2,
            shrink_factor: 0.5,
            outer_iterations: 12,
            min_mean_reversion: 1e-4,
            min_volatility: 1e-5,
            liquid_count: 10,
            pricing: SwaptionPricing::Analytic,
        }
    }
}

impl SwaptionCalibratorConfig {
    /// Set the starting point.
    pub fn with_initial(mut self, mean_reversion: f64, volatility: f64) -> Self {
        self.initial_mean_reversion = mean_reversion;
        self.initial_volatility = volatility;
        self
    }

    /// Set the initial grid spacings.
    pub fn with_steps(mut self, mean_reversion_step: f64, volatility_step: f64) -> Self {
        self.mean_reversion_step = mean_reversion_step;
        self.volatility_step = volatility_step;
        self
    }

    /// Set the number of outer iterations.
    pub fn with_outer_iterations(mut self, iterations: usize) -> Self {
        self.outer_iterations = iterations;
        self
    }

    /// Set how many leading quotes carry weight.
    pub fn with_liquid_count(mut self, liquid_count: usize) -> Self {
        self.liquid_count = liquid_count;
        self
    }

    /// Set the pricing method.
    pub fn with_pricing(mut self, pricing: SwaptionPricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// Check every setting.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let positive = [
            ("initial_mean_reversion", self.initial_mean_reversion),
            ("initial_volatility", self.initial_volatility),
            ("mean_reversion_step", self.mean_reversion_step),
            ("volatility_step", self.volatility_step),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CalibrationError::invalid_settings(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.shrink_factor > 0.0 && self.shrink_factor < 1.0) {
            return Err(CalibrationError::invalid_settings(format!(
                "shrink_factor must be in (0, 1), got {}",
                self.shrink_factor
            )));
        }
        if !(self.min_mean_reversion >= 0.0 && self.min_volatility >= 0.0) {
            return Err(CalibrationError::invalid_settings(
                "minimum mean reversion and volatility must be non-negative",
            ));
        }
        if let SwaptionPricing::MonteCarlo { paths, dt, .. } = self.pricing {
            if paths < 2 {
                return Err(CalibrationError::invalid_settings(format!(
                    "Monte Carlo pricing needs at least 2 paths, got {paths}"
                )));
            }
            if !(dt.is_finite() && dt > 0.0) {
                return Err(CalibrationError::invalid_settings(format!(
                    "Monte Carlo step must be positive, got {dt}"
                )));
            }
        }
        Ok(())
    }

    /// Weight of quote `index`.
    pub fn weight(&self, index: usize) -> f64 {
        if index < self.liquid_count {
            1.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rates::FlatCurve;
    use approx::assert_relative_eq;

    #[test]
    fn test_quote_validation() {
        assert!(SwaptionQuote::atm(5.0, 10.0, 0.008).validate(0).is_ok());
        let err = SwaptionQuote::atm(0.0, 10.0, 0.008).validate(3).unwrap_err();
        assert!(err.to_string().contains("quote 3"));
        assert!(SwaptionQuote::atm(1.0, 1.0, -0.01).validate(0).is_err());
        assert!(SwaptionQuote::atm(1.0, 1.0, 0.01)
            .with_frequency(0)
            .validate(0)
            .is_err());
    }

    #[test]
    fn test_resolve_atm_and_fixed_strike() {
        let curve = FlatCurve::new(0.02);
        let atm = SwaptionQuote::atm(2.0, 5.0, 0.007).resolve(&curve).unwrap();
        assert_relative_eq!(atm.strike, atm.forward);
        let fixed = SwaptionQuote::atm(2.0, 5.0, 0.007)
            .with_strike(0.03)
            .resolve(&curve)
            .unwrap();
        assert_eq!(fixed.strike, 0.03);
        assert_relative_eq!(fixed.annuity, atm.annuity);
    }

    #[test]
    fn test_config_validation() {
        assert!(SwaptionCalibratorConfig::default().validate().is_ok());
        let bad = SwaptionCalibratorConfig {
            shrink_factor: 1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = SwaptionCalibratorConfig::default().with_pricing(SwaptionPricing::MonteCarlo {
            paths: 1,
            dt: 0.01,
            seed: 1,
        });
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_weights() {
        let config = SwaptionCalibratorConfig::default().with_liquid_count(2);
        assert_eq!(config.weight(0), 1.0);
        assert_eq!(config.weight(1), 1.0);
        assert_eq!(config.weight(2), 0.0);
    }

    #[test]
    fn test_quote_deserialises_with_defaults() {
        let quote: SwaptionQuote = serde_json::from_str(
            r#"{"expiry": 5.0, "tenor": 10.0, "normal_vol": 0.0075}"#,
        )
        .unwrap();
        assert_eq!(quote.frequency, 1);
        assert_eq!(quote.strike, None);

        let pricing: SwaptionPricing = serde_json::from_str(
            r#"{"method": "monte_carlo", "paths": 2000, "dt": 0.02, "seed": 7}"#,
        )
        .unwrap();
        assert_eq!(
            pricing,
            SwaptionPricing::MonteCarlo {
                paths: 2000,
                dt: 0.02,
                seed: 7
            }
        );
    }
}
