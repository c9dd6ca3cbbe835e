//! Hull-White short-rate paths with the real-world risk-premium overlay.
//!
//! Both the conditional mean of `r(t_i + dt)` and the integrated rate over a
//! step are affine in `r(t_i)`, so their curve-dependent parts are computed
//! once per step ([`StepCoefficients`]) and every path only does
//! multiply-adds. Shocks are drawn up front from the single stream and paths
//! are evolved in parallel.

use esg_models::calibration::CalibratedCurve;
use esg_models::models::rates::{HullWhiteParams, RiskPremiumParams};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TimeGrid;
use crate::error::EngineError;
use crate::paths::PathMatrix;
use crate::rng::ScenarioRng;

/// Initial discount factors and forwards on the fine grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveGrid {
    dt: f64,
    p0t: Vec<f64>,
    f0t: Vec<f64>,
}

impl CurveGrid {
    /// Curve from grid values with step `dt`.
    ///
    /// # Errors
    /// `DimensionMismatch` when the slices differ in length or hold fewer than two points.
    pub fn new(dt: f64, p0t: Vec<f64>, f0t: Vec<f64>) -> Result<Self, EngineError> {
        EngineError::check_dimension("curve forwards", p0t.len(), f0t.len())?;
        if p0t.len() < 2 {
            return Err(EngineError::dimension("curve points", 2, p0t.len()));
        }
        Ok(Self { dt, p0t, f0t })
    }

    /// First `grid.n_points()` values of a calibrated curve.
    ///
    /// # Errors
    /// `DimensionMismatch` when the curve step differs from the grid step or
    /// the curve is shorter than the horizon.
    pub fn from_calibrated(
        curve: &CalibratedCurve,
        grid: &TimeGrid,
    ) -> Result<Self, EngineError> {
        if (curve.dt() - grid.dt).abs() > 1e-12 * grid.dt {
            return Err(EngineError::dimension(
                "curve steps per year",
                (1.0 / grid.dt).round() as usize,
                (1.0 / curve.dt()).round() as usize,
            ));
        }
        let n = grid.n_points();
        if curve.len() < n {
            return Err(EngineError::dimension("curve points", n, curve.len()));
        }
        Self::new(grid.dt, curve.p0t()[..n].to_vec(), curve.f0t()[..n].to_vec())
    }

    /// Flat continuously compounded curve at `rate`.
    pub fn flat(rate: f64, grid: &TimeGrid) -> Self {
        let n = grid.n_points();
        Self {
            dt: grid.dt,
            p0t: (0..n).map(|i| (-rate * grid.time(i)).exp()).collect(),
            f0t: vec![rate; n],
        }
    }

    /// Grid step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.p0t.len()
    }

    /// Whether the grid is empty.
    pub fn is_empty(&self) -> bool {
        self.p0t.is_empty()
    }

    /// Discount factors.
    pub fn p0t(&self) -> &[f64] {
        &self.p0t
    }

    /// Instantaneous forwards.
    pub fn f0t(&self) -> &[f64] {
        &self.f0t
    }
}

/// Affine one-step coefficients for step `i → i + 1`.
///
/// `E[r_{i+1} | r_i] = decay·r_i + drift` and `R_{i+1} = rate_const + k_dt·r_i`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepCoefficients {
    /// `e^{-a dt}`
    pub decay: f64,
    /// Curve part of the conditional mean
    pub drift: f64,
    /// Curve part of the integrated rate
    pub rate_const: f64,
    /// `K(dt)`
    pub k_dt: f64,
}

/// Simulated short-rate paths, risk-neutral and real-world.
///
/// Rates and risk premia are stocks at fine points; integrated rates are
/// flows stored at the end of their step with slot 0 zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateScenarios {
    /// Risk-neutral short rate `rt`
    pub short_rate: PathMatrix,
    /// Risk-neutral integrated rate `Rt`
    pub integrated_rate: PathMatrix,
    /// Risk premium `λ`
    pub risk_premium: PathMatrix,
    /// Real-world short rate
    pub short_rate_rw: PathMatrix,
    /// Real-world integrated rate
    pub integrated_rate_rw: PathMatrix,
}

impl RateScenarios {
    fn zeros(n_paths: usize, n_points: usize) -> Self {
        Self {
            short_rate: PathMatrix::zeros(n_paths, n_points),
            integrated_rate: PathMatrix::zeros(n_paths, n_points),
            risk_premium: PathMatrix::zeros(n_paths, n_points),
            short_rate_rw: PathMatrix::zeros(n_paths, n_points),
            integrated_rate_rw: PathMatrix::zeros(n_paths, n_points),
        }
    }

    /// Number of scenarios.
    pub fn len(&self) -> usize {
        self.short_rate.n_paths()
    }

    /// Whether there are no scenarios.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scenarios at `indices`, every series in lockstep.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            short_rate: self.short_rate.select_rows(indices),
            integrated_rate: self.integrated_rate.select_rows(indices),
            risk_premium: self.risk_premium.select_rows(indices),
            short_rate_rw: self.short_rate_rw.select_rows(indices),
            integrated_rate_rw: self.integrated_rate_rw.select_rows(indices),
        }
    }

    /// Append the scenarios of `other`.
    pub fn append(&mut self, other: &RateScenarios) {
        self.short_rate.append(&other.short_rate);
        self.integrated_rate.append(&other.integrated_rate);
        self.risk_premium.append(&other.risk_premium);
        self.short_rate_rw.append(&other.short_rate_rw);
        self.integrated_rate_rw.append(&other.integrated_rate_rw);
    }

    /// Keep the first `n` scenarios.
    pub fn truncate(&mut self, n: usize) {
        self.short_rate.truncate(n);
        self.integrated_rate.truncate(n);
        self.risk_premium.truncate(n);
        self.short_rate_rw.truncate(n);
        self.integrated_rate_rw.truncate(n);
    }
}

/// Short-rate path generator.
#[derive(Debug, Clone)]
pub struct HullWhiteSimulator {
    params: HullWhiteParams,
    premium: RiskPremiumParams,
    grid: TimeGrid,
    curve: CurveGrid,
    steps: Vec<StepCoefficients>,
    step_std: f64,
    antithetic: bool,
}

impl HullWhiteSimulator {
    /// Simulator on `grid` for the initial curve `curve`.
    ///
    /// # Errors
    /// - `Model` for invalid parameters
    /// - `DimensionMismatch` when the curve does not match the grid
    pub fn new(
        params: HullWhiteParams,
        premium: RiskPremiumParams,
        grid: TimeGrid,
        curve: CurveGrid,
    ) -> Result<Self, EngineError> {
        params.validate()?;
        premium.validate()?;
        EngineError::check_dimension("curve points", grid.n_points(), curve.len())?;

        let dt = grid.dt;
        let (p, f) = (curve.p0t(), curve.f0t());
        let steps = (0..grid.n_steps)
            .map(|i| {
                let t = grid.time(i);
                StepCoefficients {
                    decay: params.decay(dt),
                    drift: params.conditional_mean(t, dt, 0.0, f[i], f[i + 1]),
                    rate_const: params.integrated_rate(t, dt, p[i], p[i + 1], f[i], 0.0),
                    k_dt: params.k(dt),
                }
            })
            .collect();

        Ok(Self {
            params,
            premium,
            grid,
            step_std: params.step_std(dt),
            curve,
            steps,
            antithetic: true,
        })
    }

    /// Draw every shock independently instead of in mirrored pairs.
    pub fn with_antithetic(mut self, antithetic: bool) -> Self {
        self.antithetic = antithetic;
        self
    }

    /// Hull-White parameters.
    pub fn params(&self) -> &HullWhiteParams {
        &self.params
    }

    /// Time grid.
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Initial curve on the grid.
    pub fn curve(&self) -> &CurveGrid {
        &self.curve
    }

    /// Per-step affine coefficients.
    pub fn steps(&self) -> &[StepCoefficients] {
        &self.steps
    }

    /// Simulate `n_paths` scenarios.
    ///
    /// Consumes the rate shocks then the risk-premium shocks from `rng`.
    pub fn simulate(&self, n_paths: usize, rng: &mut ScenarioRng) -> RateScenarios {
        let n_steps = self.grid.n_steps;
        let rate_shocks = rng.shock_matrix(n_paths, n_steps, self.antithetic);
        let premium_shocks = rng.shock_matrix(n_paths, n_steps, self.antithetic);
        self.simulate_with_shocks(&rate_shocks, &premium_shocks)
    }

    /// Evolve paths from pre-drawn shocks (`n_paths × (n_steps + 1)`, column 0 unused).
    pub fn simulate_with_shocks(&self, rate_shocks: &PathMatrix, premium_shocks: &PathMatrix) -> RateScenarios {
        let n_paths = rate_shocks.n_paths();
        let n_points = self.grid.n_points();
        let mut out = RateScenarios::zeros(n_paths, n_points);

        let dt = self.grid.dt;
        let r0 = self.curve.f0t()[0];
        let std = self.step_std;
        let steps = &self.steps;
        let params = &self.params;
        let premium = &self.premium;

        let RateScenarios {
            short_rate,
            integrated_rate,
            risk_premium,
            short_rate_rw,
            integrated_rate_rw,
        } = &mut out;

        short_rate
            .par_rows_mut()
            .zip(integrated_rate.par_rows_mut())
            .zip(risk_premium.par_rows_mut())
            .zip(short_rate_rw.par_rows_mut())
            .zip(integrated_rate_rw.par_rows_mut())
            .zip(rate_shocks.as_slice().par_chunks_exact(n_points))
            .zip(premium_shocks.as_slice().par_chunks_exact(n_points))
            .for_each(|((((((rt, big_r), lambda), rt_rw), big_r_rw), z), z_lambda)| {
                rt[0] = r0;
                rt_rw[0] = r0;
                lambda[0] = premium.initial;
                for (i, c) in steps.iter().enumerate() {
                    big_r[i + 1] = c.rate_const + c.k_dt * rt[i];
                    rt[i + 1] = c.decay * rt[i] + c.drift + std * z[i + 1];

                    big_r_rw[i + 1] = c.rate_const + c.k_dt * rt_rw[i];
                    rt_rw[i + 1] = c.decay * rt_rw[i]
                        + c.drift
                        + params.risk_premium_shift(lambda[i], dt)
                        + std * z[i + 1];

                    lambda[i + 1] = premium.step(lambda[i], dt, z_lambda[i + 1]);
                }
            });

        tracing::debug!(
            n_paths,
            n_steps = self.grid.n_steps,
            mean_reversion = self.params.mean_reversion,
            volatility = self.params.volatility,
            "simulated short-rate paths"
        );
        out
    }

    /// Standardised shocks implied by risk-neutral short-rate paths,
    /// `(rt[i+1] - E[rt[i+1] | rt[i]]) / sqrt(L(dt))`, slot 0 zero.
    ///
    /// # Errors
    /// `DimensionMismatch` when the paths do not match the grid.
    pub fn residuals(&self, short_rate: &PathMatrix) -> Result<PathMatrix, EngineError> {
        EngineError::check_dimension("short-rate points", self.grid.n_points(), short_rate.n_points())?;
        let mut residuals = PathMatrix::zeros(short_rate.n_paths(), short_rate.n_points());
        let std = self.step_std;
        residuals
            .par_rows_mut()
            .zip(short_rate.as_slice().par_chunks_exact(short_rate.n_points()))
            .for_each(|(eps, rt)| {
                for (i, c) in self.steps.iter().enumerate() {
                    eps[i + 1] = (rt[i + 1] - c.decay * rt[i] - c.drift) / std;
                }
            });
        Ok(residuals)
    }
}
