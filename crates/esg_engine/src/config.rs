//! Generation configuration.
//!
//! Loaded from TOML with per-field defaults, optionally overridden from
//! `ESG_*` environment variables, then validated as a whole so every problem
//! is reported at once.
//!
//! ```toml
//! [simulation]
//! n_scenarios = 1000
//! horizon_years = 10.0
//! dt_fine = 0.01
//! dt_report = 1.0
//! seed = 42
//!
//! [filter]
//! lim_high = 0.10
//! lim_low = -0.05
//!
//! [hull_white]
//! mean_reversion = 0.05
//! volatility = 0.01
//! ```

use std::path::Path;

use esg_models::calibration::{CurveSmoothing, SwaptionCalibratorConfig};
use esg_models::models::equity::EquityParams;
use esg_models::models::hybrid::FactorCorrelation;
use esg_models::models::rates::{HullWhiteParams, RiskPremiumParams};
use esg_models::models::real_estate::RealEstateParams;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum number of scenarios per batch.
pub const MAX_SCENARIOS: usize = 1_000_000;

/// Maximum number of fine time steps.
pub const MAX_STEPS: usize = 100_000;

/// Scenario count and time grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Target number of scenarios `N`
    #[serde(default = "default_n_scenarios")]
    pub n_scenarios: usize,
    /// Projection horizon `T` in years
    #[serde(default = "default_horizon_years")]
    pub horizon_years: f64,
    /// Internal discretisation step
    #[serde(default = "default_dt_fine")]
    pub dt_fine: f64,
    /// Reporting step; a whole multiple of `dt_fine`
    #[serde(default = "default_dt_report")]
    pub dt_report: f64,
    /// Seed of the single random stream
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Mirror the second half of every draw (requires an even `N`)
    #[serde(default = "default_antithetic")]
    pub antithetic: bool,
}

fn default_n_scenarios() -> usize {
    1000
}

fn default_horizon_years() -> f64 {
    30.0
}

fn default_dt_fine() -> f64 {
    0.02
}

fn default_dt_report() -> f64 {
    1.0
}

fn default_seed() -> u64 {
    42
}

fn default_antithetic() -> bool {
    true
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n_scenarios: default_n_scenarios(),
            horizon_years: default_horizon_years(),
            dt_fine: default_dt_fine(),
            dt_report: default_dt_report(),
            seed: default_seed(),
            antithetic: default_antithetic(),
        }
    }
}

/// Rate bounds and regeneration policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Apply the filter at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Upper bound as a simple annual rate
    #[serde(default = "default_lim_high")]
    pub lim_high: f64,
    /// Lower bound as a simple annual rate
    #[serde(default = "default_lim_low")]
    pub lim_low: f64,
    /// Fraction of `N` above which the filter is abandoned
    #[serde(default = "default_abandon_fraction")]
    pub abandon_fraction: f64,
    /// Maximum regeneration rounds
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_lim_high() -> f64 {
    0.10
}

fn default_lim_low() -> f64 {
    -0.05
}

fn default_abandon_fraction() -> f64 {
    0.5
}

fn default_max_iterations() -> usize {
    50
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            lim_high: default_lim_high(),
            lim_low: default_lim_low(),
            abandon_fraction: default_abandon_fraction(),
            max_iterations: default_max_iterations(),
        }
    }
}

/// Long-end forward smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveConfig {
    /// Maturity from which forwards are averaged
    #[serde(default = "default_smoothing_start")]
    pub smoothing_start: f64,
    /// Averaging window in years
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: f64,
}

fn default_smoothing_start() -> f64 {
    60.0
}

fn default_smoothing_window() -> f64 {
    20.0
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            smoothing_start: default_smoothing_start(),
            smoothing_window: default_smoothing_window(),
        }
    }
}

impl CurveConfig {
    /// Smoothing settings for the curve calibrator.
    pub fn smoothing(&self) -> CurveSmoothing {
        CurveSmoothing {
            start: self.smoothing_start,
            window: self.smoothing_window,
        }
    }
}

/// Complete generation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Scenario count and time grid
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Path filter
    #[serde(default)]
    pub filter: FilterConfig,
    /// Initial curve smoothing
    #[serde(default)]
    pub curve: CurveConfig,
    /// Fixed Hull-White parameters; calibrated to swaptions when absent
    #[serde(default)]
    pub hull_white: Option<HullWhiteParams>,
    /// Real-world risk premium process
    #[serde(default)]
    pub risk_premium: RiskPremiumParams,
    /// Equity model
    #[serde(default)]
    pub equity: EquityParams,
    /// Real-estate model
    #[serde(default)]
    pub real_estate: RealEstateParams,
    /// Swaption calibration
    #[serde(default)]
    pub swaption: SwaptionCalibratorConfig,
    /// Target correlation of the five risk factors
    #[serde(default)]
    pub correlation: FactorCorrelation,
}

impl GenerationConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Load from file with environment overrides and validate.
    pub fn load_with_env_and_validate(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?.with_env_override();
        config.validate()?;
        Ok(config)
    }

    /// Set the target factor correlation.
    pub fn with_correlation(mut self, correlation: FactorCorrelation) -> Self {
        self.correlation = correlation;
        self
    }

    /// Set fixed Hull-White parameters.
    pub fn with_hull_white(mut self, params: HullWhiteParams) -> Self {
        self.hull_white = Some(params);
        self
    }

    /// Set the scenario count.
    pub fn with_scenarios(mut self, n_scenarios: usize) -> Self {
        self.simulation.n_scenarios = n_scenarios;
        self
    }

    /// Set the horizon and both time steps.
    pub fn with_time_grid(mut self, horizon_years: f64, dt_fine: f64, dt_report: f64) -> Self {
        self.simulation.horizon_years = horizon_years;
        self.simulation.dt_fine = dt_fine;
        self.simulation.dt_report = dt_report;
        self
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.simulation.seed = seed;
        self
    }

    /// Set the filter bounds.
    pub fn with_bounds(mut self, lim_low: f64, lim_high: f64) -> Self {
        self.filter.lim_low = lim_low;
        self.filter.lim_high = lim_high;
        self
    }

    /// Apply `ESG_*` environment variable overrides.
    pub fn with_env_override(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by `ESG_*` variable names.
    ///
    /// Unparseable values are logged and ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: Option<String>, target: &mut T) {
            if let Some(raw) = raw {
                match raw.trim().parse() {
                    Ok(value) => *target = value,
                    Err(_) => tracing::warn!(key, value = %raw, "ignoring unparseable override"),
                }
            }
        }

        let sim = &mut self.simulation;
        parse("ESG_N_SCENARIOS", lookup("ESG_N_SCENARIOS"), &mut sim.n_scenarios);
        parse("ESG_HORIZON_YEARS", lookup("ESG_HORIZON_YEARS"), &mut sim.horizon_years);
        parse("ESG_DT_FINE", lookup("ESG_DT_FINE"), &mut sim.dt_fine);
        parse("ESG_DT_REPORT", lookup("ESG_DT_REPORT"), &mut sim.dt_report);
        parse("ESG_SEED", lookup("ESG_SEED"), &mut sim.seed);

        let filter = &mut self.filter;
        parse("ESG_FILTER_ENABLED", lookup("ESG_FILTER_ENABLED"), &mut filter.enabled);
        parse("ESG_LIM_HIGH", lookup("ESG_LIM_HIGH"), &mut filter.lim_high);
        parse("ESG_LIM_LOW", lookup("ESG_LIM_LOW"), &mut filter.lim_low);
        parse("ESG_MAX_ITERATIONS", lookup("ESG_MAX_ITERATIONS"), &mut filter.max_iterations);

        let a = lookup("ESG_HW_MEAN_REVERSION");
        let sigma = lookup("ESG_HW_VOLATILITY");
        if a.is_some() || sigma.is_some() {
            let mut params = self.hull_white.unwrap_or(HullWhiteParams {
                mean_reversion: 0.05,
                volatility: 0.01,
            });
            parse("ESG_HW_MEAN_REVERSION", a, &mut params.mean_reversion);
            parse("ESG_HW_VOLATILITY", sigma, &mut params.volatility);
            self.hull_white = Some(params);
        }
        self
    }

    /// Validate every section, collecting all problems.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        let sim = &self.simulation;

        if sim.n_scenarios == 0 || sim.n_scenarios > MAX_SCENARIOS {
            errors.push(format!(
                "n_scenarios {} must be in [1, {MAX_SCENARIOS}]",
                sim.n_scenarios
            ));
        }
        if sim.antithetic && sim.n_scenarios % 2 != 0 {
            errors.push(format!(
                "n_scenarios {} must be even for antithetic sampling",
                sim.n_scenarios
            ));
        }
        if let Err(e) = TimeGrid::from_config(sim) {
            errors.push(e);
        }

        let filter = &self.filter;
        if !(filter.lim_low > -1.0 && filter.lim_low < filter.lim_high && filter.lim_high.is_finite()) {
            errors.push(format!(
                "filter bounds must satisfy -1 < lim_low < lim_high, got [{}, {}]",
                filter.lim_low, filter.lim_high
            ));
        }
        if !(filter.abandon_fraction > 0.0 && filter.abandon_fraction <= 1.0) {
            errors.push(format!(
                "abandon_fraction must be in (0, 1], got {}",
                filter.abandon_fraction
            ));
        }
        if filter.max_iterations == 0 {
            errors.push("max_iterations must be greater than 0".to_string());
        }

        if !(self.curve.smoothing_start >= 0.0 && self.curve.smoothing_window >= 0.0) {
            errors.push(format!(
                "curve smoothing start and window must be non-negative, got {} and {}",
                self.curve.smoothing_start, self.curve.smoothing_window
            ));
        }

        if let Some(params) = &self.hull_white {
            if let Err(e) = params.validate() {
                errors.push(e.to_string());
            }
        }
        let models = [
            self.risk_premium.validate(),
            self.equity.validate(),
            self.real_estate.validate(),
        ];
        errors.extend(models.into_iter().filter_map(|r| r.err()).map(|e| e.to_string()));
        if let Err(e) = self.swaption.validate() {
            errors.push(e.to_string());
        }
        if let Err(e) = self.correlation.cholesky() {
            errors.push(format!("correlation: {e}"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Time grid of a validated configuration.
    pub fn time_grid(&self) -> Result<TimeGrid, ConfigError> {
        TimeGrid::from_config(&self.simulation).map_err(|e| ConfigError::Validation(vec![e]))
    }
}

/// Fine and reporting grids derived from [`SimulationConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    /// Fine step
    pub dt: f64,
    /// Reporting step
    pub dt_report: f64,
    /// Fine steps; fine points are `0..=n_steps`
    pub n_steps: usize,
    /// Fine steps per reporting step
    pub stride: usize,
    /// Reporting steps; reporting points are `0..=n_report`
    pub n_report: usize,
}

impl TimeGrid {
    fn from_config(sim: &SimulationConfig) -> Result<Self, String> {
        if !(sim.dt_fine.is_finite() && sim.dt_fine > 0.0) {
            return Err(format!("dt_fine must be positive, got {}", sim.dt_fine));
        }
        if !(sim.horizon_years.is_finite() && sim.horizon_years > 0.0) {
            return Err(format!("horizon_years must be positive, got {}", sim.horizon_years));
        }
        if !(sim.dt_report.is_finite() && sim.dt_report >= sim.dt_fine) {
            return Err(format!(
                "dt_report {} must be at least dt_fine {}",
                sim.dt_report, sim.dt_fine
            ));
        }
        let n_steps = (sim.horizon_years / sim.dt_fine).round() as usize;
        let stride = (sim.dt_report / sim.dt_fine).round() as usize;
        if ((stride as f64) * sim.dt_fine - sim.dt_report).abs() > 1e-9 * sim.dt_report {
            return Err(format!(
                "dt_report {} is not a whole multiple of dt_fine {}",
                sim.dt_report, sim.dt_fine
            ));
        }
        if n_steps == 0 || n_steps > MAX_STEPS {
            return Err(format!("fine step count {n_steps} must be in [1, {MAX_STEPS}]"));
        }
        if n_steps % stride != 0 {
            return Err(format!(
                "horizon {} is not a whole number of reporting steps {}",
                sim.horizon_years, sim.dt_report
            ));
        }
        Ok(Self {
            dt: sim.dt_fine,
            dt_report: sim.dt_report,
            n_steps,
            stride,
            n_report: n_steps / stride,
        })
    }

    /// Fine grid points, `t = 0` included.
    pub fn n_points(&self) -> usize {
        self.n_steps + 1
    }

    /// Reporting grid points, `t = 0` included.
    pub fn n_report_points(&self) -> usize {
        self.n_report + 1
    }

    /// Time of fine point `i`.
    #[inline]
    pub fn time(&self, i: usize) -> f64 {
        i as f64 * self.dt
    }

    /// Reporting times `0, dt_report, ..., T`.
    pub fn report_times(&self) -> Vec<f64> {
        (0..=self.n_report).map(|k| k as f64 * self.dt_report).collect()
    }

    /// Horizon `T`.
    pub fn horizon(&self) -> f64 {
        self.n_steps as f64 * self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = GenerationConfig::default();
        assert!(config.validate().is_ok());
        let grid = config.time_grid().unwrap();
        assert_eq!(grid.n_steps, 1500);
        assert_eq!(grid.stride, 50);
        assert_eq!(grid.n_report, 30);
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let config = GenerationConfig::from_toml_str(
            r#"
            [simulation]
            n_scenarios = 500
            horizon_years = 10.0
            dt_fine = 0.01

            [filter]
            lim_high = 0.08

            [hull_white]
            mean_reversion = 0.05
            volatility = 0.01

            [equity]
            volatility = 0.2
            "#,
        )
        .unwrap();
        assert_eq!(config.simulation.n_scenarios, 500);
        assert_eq!(config.simulation.dt_report, 1.0);
        assert_eq!(config.filter.lim_high, 0.08);
        assert_eq!(config.filter.lim_low, -0.05);
        assert_eq!(config.hull_white.unwrap().volatility, 0.01);
        assert_eq!(config.equity.volatility, 0.2);
        assert_eq!(config.equity.dividend_yield, 0.02);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_error() {
        let err = GenerationConfig::from_toml_str("[simulation]\nn_scenarios = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let mut config = GenerationConfig::default().with_scenarios(999).with_bounds(0.1, 0.05);
        config.filter.max_iterations = 0;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 3);
                assert!(errors[0].contains("even"));
            }
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_report_step_must_divide() {
        let config = GenerationConfig::default().with_time_grid(10.0, 0.03, 1.0);
        assert!(config.validate().is_err());
        let config = GenerationConfig::default().with_time_grid(10.5, 0.01, 1.0);
        assert!(config.validate().is_err());
        let config = GenerationConfig::default().with_time_grid(10.0, 0.025, 0.5);
        let grid = config.time_grid().unwrap();
        assert_eq!((grid.n_steps, grid.stride, grid.n_report), (400, 20, 20));
        assert_eq!(grid.report_times()[3], 1.5);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ESG_N_SCENARIOS", "200"),
            ("ESG_SEED", "7"),
            ("ESG_LIM_HIGH", "0.2"),
            ("ESG_HW_VOLATILITY", "0.015"),
            ("ESG_DT_FINE", "not-a-number"),
        ]
        .into_iter()
        .collect();
        let config = GenerationConfig::default()
            .with_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.simulation.n_scenarios, 200);
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.filter.lim_high, 0.2);
        assert_eq!(config.simulation.dt_fine, 0.02);
        let hw = config.hull_white.unwrap();
        assert_eq!(hw.volatility, 0.015);
        assert_eq!(hw.mean_reversion, 0.05);
    }

    #[test]
    fn test_invalid_model_parameters_are_reported() {
        let mut config = GenerationConfig::default();
        config.equity.volatility = -0.1;
        config.hull_white = Some(HullWhiteParams {
            mean_reversion: 0.0,
            volatility: 0.01,
        });
        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_correlation_is_reported() {
        let mut rows = *FactorCorrelation::default().cholesky_rows();
        rows[0][3] = 1.5;
        rows[3][0] = 1.5;
        let config = GenerationConfig::default().with_correlation(FactorCorrelation::from_cholesky_rows(rows));
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].starts_with("correlation"));
            }
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[test]
    fn test_serialise_round_trip() {
        let config = GenerationConfig::default().with_hull_white(HullWhiteParams {
            mean_reversion: 0.03,
            volatility: 0.008,
        });
        let text = toml::to_string(&config).unwrap();
        assert_eq!(GenerationConfig::from_toml_str(&text).unwrap(), config);
    }
}
