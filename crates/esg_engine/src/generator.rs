//! End-to-end scenario generation.
//!
//! # Pipeline
//!
//! 1. Bootstrap the benchmark curve onto the fine grid
//! 2. Take Hull-White parameters from the configuration or fit them to swaptions
//! 3. Simulate `N` short-rate paths in both measures
//! 4. Filter exploding paths, regenerating replacements
//! 5. Correlate the asset shocks with the residuals of the kept paths
//! 6. Build asset returns and deflators, downsample to the reporting grid
//!
//! Every random draw comes from one stream seeded by the configuration, in
//! the order above, so a run is reproducible for a fixed seed.

use esg_core::market_data::BenchmarkCurve;
use esg_models::calibration::{
    CalibratedCurve, CalibrationDiagnostics, CurveCalibrator, SwaptionCalibrator, SwaptionQuote,
};
use esg_models::models::rates::HullWhiteParams;

use crate::assets::{cash_returns, equity_returns, real_estate_returns};
use crate::batch::{ScenarioBatch, ScenarioSet};
use crate::config::{GenerationConfig, TimeGrid};
use crate::deflator::DeflatorBuilder;
use crate::diagnostics::RunDiagnostics;
use crate::error::EngineError;
use crate::filter::{FilterOutcome, PathFilter};
use crate::rng::ScenarioRng;
use crate::shocks::{CorrelationEngine, ShockTensor};
use crate::simulator::{CurveGrid, HullWhiteSimulator, RateScenarios};

/// Scenarios and the diagnostics of the run that produced them.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// Exported scenarios
    pub batch: ScenarioBatch,
    /// Calibration and simulation diagnostics
    pub diagnostics: RunDiagnostics,
}

/// Runs the generation pipeline for one validated configuration.
#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    config: GenerationConfig,
    grid: TimeGrid,
}

impl ScenarioGenerator {
    /// Generator for `config`.
    ///
    /// # Errors
    /// `Config` when the configuration fails validation.
    pub fn new(config: GenerationConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let grid = config.time_grid()?;
        Ok(Self { config, grid })
    }

    /// Configuration.
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Fine and reporting grids.
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Bootstrap `benchmark` on the fine grid.
    ///
    /// # Errors
    /// `Calibration` when the curve cannot be bootstrapped.
    pub fn calibrate_curve(&self, benchmark: &BenchmarkCurve) -> Result<CalibratedCurve, EngineError> {
        let _span = tracing::info_span!("calibrate_curve", pillars = benchmark.len()).entered();
        let curve = CurveCalibrator::new(self.grid.dt)?
            .with_smoothing(self.config.curve.smoothing())
            .calibrate(benchmark)?;
        tracing::info!(points = curve.len(), horizon = curve.horizon(), "calibrated initial curve");
        Ok(curve)
    }

    /// Hull-White parameters: the configured ones, else a swaption fit.
    ///
    /// # Errors
    /// - `MissingHullWhiteParameters` with neither configured parameters nor quotes
    /// - `Calibration` when the swaption fit fails
    pub fn calibrate_hull_white(
        &self,
        curve: &CalibratedCurve,
        quotes: &[SwaptionQuote],
    ) -> Result<(HullWhiteParams, Option<CalibrationDiagnostics>), EngineError> {
        if let Some(params) = self.config.hull_white {
            tracing::info!(
                mean_reversion = params.mean_reversion,
                volatility = params.volatility,
                "using configured Hull-White parameters"
            );
            return Ok((params, None));
        }
        if quotes.is_empty() {
            return Err(EngineError::MissingHullWhiteParameters);
        }
        let _span = tracing::info_span!("calibrate_swaptions", quotes = quotes.len()).entered();
        let result = SwaptionCalibrator::new(self.config.swaption)?.calibrate(curve, quotes)?;
        Ok((result.parameters, Some(result.diagnostics)))
    }

    /// Full pipeline from market data.
    ///
    /// # Errors
    /// Any calibration, filter or dimension error of the stages.
    pub fn generate(
        &self,
        benchmark: &BenchmarkCurve,
        quotes: &[SwaptionQuote],
    ) -> Result<GenerationOutput, EngineError> {
        let calibrated = self.calibrate_curve(benchmark)?;
        let (params, swaption) = self.calibrate_hull_white(&calibrated, quotes)?;
        let curve = CurveGrid::from_calibrated(&calibrated, &self.grid)?;
        self.generate_on_curve(&curve, params, swaption)
    }

    /// Pipeline from step 3 on an already gridded curve.
    ///
    /// # Errors
    /// - `ScenarioCountMismatch` when the filter cannot assemble `N` scenarios
    /// - `Calibration` for a correlation matrix without a Cholesky factor
    /// - `DimensionMismatch` when `curve` does not match the grid
    pub fn generate_on_curve(
        &self,
        curve: &CurveGrid,
        params: HullWhiteParams,
        swaption: Option<CalibrationDiagnostics>,
    ) -> Result<GenerationOutput, EngineError> {
        let sim_config = &self.config.simulation;
        let n_scenarios = sim_config.n_scenarios;
        let simulator = HullWhiteSimulator::new(params, self.config.risk_premium, self.grid, curve.clone())?
            .with_antithetic(sim_config.antithetic);
        let engine = CorrelationEngine::new(&self.config.correlation)?.with_antithetic(sim_config.antithetic);
        let mut rng = ScenarioRng::from_seed(sim_config.seed);

        let paths = {
            let _span = tracing::info_span!("simulate", n_scenarios, n_steps = self.grid.n_steps).entered();
            simulator.simulate(n_scenarios, &mut rng)
        };

        let (paths, outcome) = {
            let _span = tracing::info_span!("filter").entered();
            if self.config.filter.enabled {
                PathFilter::new(&self.config.filter, &self.grid)
                    .apply(paths, n_scenarios, |n| Ok(simulator.simulate(n, &mut rng)))?
            } else {
                (paths, FilterOutcome::Disabled)
            }
        };

        let shocks = {
            let _span = tracing::info_span!("correlate").entered();
            let residuals = simulator.residuals(&paths.short_rate)?;
            let shocks = engine.correlate(&residuals, &mut rng)?;
            if tracing::enabled!(tracing::Level::DEBUG) {
                let check = engine.verify(&shocks);
                tracing::debug!(max_abs_error = check.max_abs_error, "realised shock correlation");
            }
            shocks
        };

        let (risk_neutral, real_world) = {
            let _span = tracing::info_span!("assets").entered();
            (
                self.scenario_set(&paths, curve, &shocks, false)?,
                self.scenario_set(&paths, curve, &shocks, true)?,
            )
        };
        let deflators = DeflatorBuilder::new(self.grid.stride).build_tensor(&paths)?;

        let batch = ScenarioBatch {
            report_times: self.grid.report_times(),
            risk_neutral,
            real_world,
            deflators,
            shocks,
            filter: outcome,
            path_explosion: outcome.is_abandoned(),
        };
        let diagnostics = RunDiagnostics::from_batch(&batch, curve, self.grid.stride, params, swaption)?;

        tracing::info!(
            n_scenarios = batch.n_scenarios(),
            report_points = batch.n_report_points(),
            rejection_fraction = diagnostics.rejection_fraction,
            path_explosion = batch.path_explosion,
            max_martingale_error = diagnostics.max_martingale_error(),
            "generated scenario batch"
        );
        Ok(GenerationOutput { batch, diagnostics })
    }

    fn scenario_set(
        &self,
        paths: &RateScenarios,
        curve: &CurveGrid,
        shocks: &ShockTensor,
        real_world: bool,
    ) -> Result<ScenarioSet, EngineError> {
        let (short_rate, integrated) = if real_world {
            (&paths.short_rate_rw, &paths.integrated_rate_rw)
        } else {
            (&paths.short_rate, &paths.integrated_rate)
        };
        let stride = self.grid.stride;
        let equity = equity_returns(&self.config.equity, self.grid.dt, integrated, shocks, real_world)?;
        let real_estate = real_estate_returns(&self.config.real_estate, curve, shocks, real_world)?;
        Ok(ScenarioSet {
            short_rate: short_rate.downsample_stock(stride),
            cash: cash_returns(integrated).downsample(stride),
            equity: equity.downsample(stride),
            real_estate: real_estate.downsample(stride),
        })
    }
}
