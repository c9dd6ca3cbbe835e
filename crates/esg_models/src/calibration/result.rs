//! Calibration result types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fit quality of a calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationDiagnostics {
    /// Outer iterations performed
    pub iterations: usize,
    /// Objective function evaluations performed
    pub evaluations: usize,
    /// Final objective value (weighted sum of squared errors)
    pub final_residual: f64,
    /// Root mean squared error over weighted instruments
    pub rmse: f64,
    /// Largest absolute error over weighted instruments
    pub max_error: f64,
    /// Wall-clock duration
    pub duration: Duration,
    /// Model minus market error per instrument
    pub instrument_errors: Vec<f64>,
}

impl Default for CalibrationDiagnostics {
    fn default() -> Self {
        Self {
            iterations: 0,
            evaluations: 0,
            final_residual: f64::MAX,
            rmse: f64::MAX,
            max_error: f64::MAX,
            duration: Duration::ZERO,
            instrument_errors: Vec::new(),
        }
    }
}

impl CalibrationDiagnostics {
    /// Diagnostics with iteration counts and the final objective value.
    pub fn new(iterations: usize, evaluations: usize, final_residual: f64, duration: Duration) -> Self {
        Self {
            iterations,
            evaluations,
            final_residual,
            duration,
            ..Self::default()
        }
    }

    /// Set per-instrument errors and derive RMSE and max error over the
    /// instruments with a positive weight.
    pub fn with_instrument_errors(mut self, errors: Vec<f64>, weights: &[f64]) -> Self {
        let total_weight: f64 = weights.iter().sum();
        if total_weight > 0.0 {
            let sse: f64 = errors
                .iter()
                .zip(weights)
                .filter(|(_, &w)| w > 0.0)
                .map(|(e, w)| w * e * e)
                .sum();
            self.rmse = (sse / total_weight).sqrt();
            self.max_error = errors
                .iter()
                .zip(weights)
                .filter(|(_, &w)| w > 0.0)
                .map(|(e, _)| e.abs())
                .fold(0.0_f64, f64::max);
        }
        self.instrument_errors = errors;
        self
    }

    /// Whether the RMSE is within `tolerance`.
    pub fn is_quality_acceptable(&self, tolerance: f64) -> bool {
        self.rmse <= tolerance
    }
}

/// Calibrated parameters with their diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult<P> {
    /// Calibrated parameters
    pub parameters: P,
    /// Calibration diagnostics
    pub diagnostics: CalibrationDiagnostics,
}

impl<P> CalibrationResult<P> {
    /// Bundle parameters and diagnostics.
    pub fn new(parameters: P, diagnostics: CalibrationDiagnostics) -> Self {
        Self {
            parameters,
            diagnostics,
        }
    }

    /// Calibrated parameters.
    pub fn params(&self) -> &P {
        &self.parameters
    }

    /// Calibration diagnostics.
    pub fn diagnostics(&self) -> &CalibrationDiagnostics {
        &self.diagnostics
    }

    /// RMSE of the fit.
    pub fn rmse(&self) -> f64 {
        self.diagnostics.rmse
    }

    /// Map the parameter type to a different type.
    pub fn map<Q, F>(self, f: F) -> CalibrationResult<Q>
    where
        F: FnOnce(P) -> Q,
    {
        CalibrationResult {
            parameters: f(self.parameters),
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_default() {
        let diag = CalibrationDiagnostics::default();
        assert_eq!(diag.iterations, 0);
        assert_eq!(diag.final_residual, f64::MAX);
        assert!(!diag.is_quality_acceptable(1.0));
    }

    #[test]
    fn test_weighted_errors() {
        let diag = CalibrationDiagnostics::new(3, 40, 0.0, Duration::from_millis(5))
            .with_instrument_errors(vec![0.001, -0.002, 0.5], &[1.0, 1.0, 0.0]);
        // The unweighted 0.5 error is excluded
        assert!((diag.rmse - (0.000_005_f64 / 2.0).sqrt()).abs() < 1e-15);
        assert!((diag.max_error - 0.002).abs() < 1e-15);
        assert_eq!(diag.instrument_errors.len(), 3);
    }

    #[test]
    fn test_result_map() {
        let result = CalibrationResult::new(2.0_f64, CalibrationDiagnostics::default());
        let mapped = result.map(|p| p * 2.0);
        assert_eq!(*mapped.params(), 4.0);
    }
}
