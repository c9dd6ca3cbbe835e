//! Calibration and simulation diagnostics of a generation run.

use esg_core::math::statistics;
use esg_models::calibration::CalibrationDiagnostics;
use esg_models::models::rates::HullWhiteParams;
use serde::{Deserialize, Serialize};

use crate::batch::ScenarioBatch;
use crate::error::EngineError;
use crate::filter::FilterOutcome;
use crate::paths::PathMatrix;
use crate::simulator::CurveGrid;

const BAND_PROBS: [f64; 5] = [0.05, 0.25, 0.50, 0.75, 0.95];

/// Mean and 5/25/50/75/95% quantiles of a cross-scenario sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantileBand {
    /// Sample mean
    pub mean: f64,
    /// 5% quantile
    pub p05: f64,
    /// 25% quantile
    pub p25: f64,
    /// Median
    pub p50: f64,
    /// 75% quantile
    pub p75: f64,
    /// 95% quantile
    pub p95: f64,
}

impl QuantileBand {
    /// Band of `values`; `None` when empty or holding NaN.
    pub fn from_sample(values: &[f64]) -> Option<Self> {
        let mean = statistics::mean(values)?;
        let q = statistics::quantiles(values, &BAND_PROBS)?;
        Some(Self {
            mean,
            p05: q[0],
            p25: q[1],
            p50: q[2],
            p75: q[3],
            p95: q[4],
        })
    }

    /// Bands at every point of `paths`, e.g. of the equity returns of a
    /// batch. Points without a usable sample hold NaN.
    pub fn across_paths(paths: &PathMatrix) -> Vec<Self> {
        (0..paths.n_points())
            .map(|j| {
                let column = paths.column(j);
                Self::from_sample(&column).unwrap_or(Self {
                    mean: f64::NAN,
                    p05: f64::NAN,
                    p25: f64::NAN,
                    p50: f64::NAN,
                    p75: f64::NAN,
                    p95: f64::NAN,
                })
            })
            .collect()
    }
}

/// What a run produced against what the curve implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    /// Hull-White parameters used
    pub hull_white: HullWhiteParams,
    /// Swaption fit, when the parameters were calibrated
    pub swaption: Option<CalibrationDiagnostics>,
    /// Path filter outcome
    pub filter: FilterOutcome,
    /// Rejected scenarios over the target count
    pub rejection_fraction: f64,
    /// The filter was abandoned
    pub path_explosion: bool,
    /// Reporting times in years
    pub report_times: Vec<f64>,
    /// Curve discount factors `P0t` at the reporting points
    pub target_discount: Vec<f64>,
    /// Curve forwards `f0t` at the reporting points
    pub target_forward: Vec<f64>,
    /// Risk-neutral deflators per reporting point
    pub deflator: Vec<QuantileBand>,
    /// Risk-neutral short rate per reporting point
    pub short_rate: Vec<QuantileBand>,
    /// `mean(DF) / P0t - 1` per reporting point
    pub martingale_error: Vec<f64>,
}

impl RunDiagnostics {
    /// Diagnostics of `batch` against `curve`, which is on the fine grid
    /// sampled every `stride` points.
    ///
    /// # Errors
    /// `DimensionMismatch` when the curve does not reach the last reporting point.
    pub fn from_batch(
        batch: &ScenarioBatch,
        curve: &CurveGrid,
        stride: usize,
        hull_white: HullWhiteParams,
        swaption: Option<CalibrationDiagnostics>,
    ) -> Result<Self, EngineError> {
        let n_report = batch.n_report_points();
        let needed = n_report.saturating_sub(1) * stride + 1;
        if curve.len() < needed {
            return Err(EngineError::dimension("curve points", needed, curve.len()));
        }
        let target_discount: Vec<f64> = (0..n_report).map(|k| curve.p0t()[k * stride]).collect();
        let target_forward = (0..n_report).map(|k| curve.f0t()[k * stride]).collect();

        let deflator = QuantileBand::across_paths(&batch.deflators.risk_neutral);
        let martingale_error = deflator
            .iter()
            .zip(&target_discount)
            .map(|(band, p)| band.mean / p - 1.0)
            .collect();

        let target = batch.n_scenarios().max(1) as f64;
        Ok(Self {
            hull_white,
            swaption,
            filter: batch.filter,
            rejection_fraction: batch.filter.removed() as f64 / target,
            path_explosion: batch.path_explosion,
            report_times: batch.report_times.clone(),
            target_discount,
            target_forward,
            deflator,
            short_rate: QuantileBand::across_paths(&batch.risk_neutral.short_rate),
            martingale_error,
        })
    }

    /// Largest absolute martingale error over the reporting points.
    pub fn max_martingale_error(&self) -> f64 {
        self.martingale_error
            .iter()
            .fold(0.0_f64, |acc, e| acc.max(e.abs()))
    }
}
