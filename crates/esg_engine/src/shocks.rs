//! Correlated shocks for the satellite asset models.
//!
//! The correlation matrix is factorised in [`RiskFactor::CHOLESKY_ORDER`]
//! with the short rate first. The short-rate slot is not drawn: it is
//! supplied by the caller as the residuals of the simulated rate paths, so
//! the asset shocks are correlated with the rates that were actually
//! simulated. The four other factors are drawn independently (antithetic
//! pairs when enabled) and mixed through the Cholesky factor. The result is
//! stored per factor and looked up by [`RiskFactor`], never by position.

use esg_core::math::statistics;
use esg_models::calibration::CalibrationError;
use esg_models::models::hybrid::{CholeskyFactor, FactorCorrelation, RiskFactor, N_FACTORS};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::paths::PathMatrix;
use crate::rng::ScenarioRng;

/// Correlated shocks indexed by (factor, scenario, fine point).
///
/// Slot 0 of every row is zero; the shock of step `i → i + 1` sits at `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockTensor {
    /// Shock matrices in [`RiskFactor::CANONICAL_ORDER`]
    factors: Vec<PathMatrix>,
}

impl ShockTensor {
    /// Shocks of one factor.
    pub fn factor(&self, factor: RiskFactor) -> &PathMatrix {
        &self.factors[factor.canonical_index()]
    }

    /// Shock matrices in canonical order.
    pub fn factors(&self) -> &[PathMatrix] {
        &self.factors
    }

    /// Number of scenarios.
    pub fn n_scenarios(&self) -> usize {
        self.factors.first().map_or(0, PathMatrix::n_paths)
    }

    /// Number of fine points.
    pub fn n_points(&self) -> usize {
        self.factors.first().map_or(0, PathMatrix::n_points)
    }

    /// Shock of `factor` for `scenario` over the step ending at `point`.
    pub fn get(&self, factor: RiskFactor, scenario: usize, point: usize) -> f64 {
        self.factor(factor).get(scenario, point)
    }
}

/// Independent standard normal draws before mixing, one matrix per
/// non-anchor factor in Cholesky order.
#[derive(Debug, Clone, PartialEq)]
pub struct IndependentDraws {
    draws: Vec<PathMatrix>,
}

impl IndependentDraws {
    /// Draws of a non-anchor factor; `None` for the anchor.
    pub fn factor(&self, factor: RiskFactor) -> Option<&PathMatrix> {
        factor
            .cholesky_index()
            .checked_sub(1)
            .and_then(|i| self.draws.get(i))
    }
}

/// Builds [`ShockTensor`]s from a target correlation.
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    correlation: FactorCorrelation,
    cholesky: CholeskyFactor<f64>,
    antithetic: bool,
}

impl CorrelationEngine {
    /// Factorise `correlation`.
    ///
    /// # Errors
    /// `CalibrationError::Correlation` when the matrix is not a valid
    /// positive-definite correlation matrix.
    pub fn new(correlation: &FactorCorrelation) -> Result<Self, CalibrationError> {
        let cholesky = correlation.cholesky()?;
        Ok(Self {
            correlation: correlation.clone(),
            cholesky,
            antithetic: true,
        })
    }

    /// Draw independent factors in mirrored pairs or not.
    pub fn with_antithetic(mut self, antithetic: bool) -> Self {
        self.antithetic = antithetic;
        self
    }

    /// Target correlation.
    pub fn correlation(&self) -> &FactorCorrelation {
        &self.correlation
    }

    /// Lower Cholesky factor in Cholesky order.
    pub fn cholesky(&self) -> &CholeskyFactor<f64> {
        &self.cholesky
    }

    /// Draw the four non-anchor factors from `rng`.
    pub fn draw_independent(&self, rng: &mut ScenarioRng, n_paths: usize, n_steps: usize) -> IndependentDraws {
        let draws = (1..N_FACTORS)
            .map(|_| rng.shock_matrix(n_paths, n_steps, self.antithetic))
            .collect();
        IndependentDraws { draws }
    }

    /// Mix the anchor residuals with independent draws.
    ///
    /// # Errors
    /// `DimensionMismatch` when the draws do not match the anchor's shape.
    pub fn mix(&self, anchor: &PathMatrix, independent: &IndependentDraws) -> Result<ShockTensor, EngineError> {
        EngineError::check_dimension("independent factors", N_FACTORS - 1, independent.draws.len())?;
        for draws in &independent.draws {
            EngineError::check_dimension("shock scenarios", anchor.n_paths(), draws.n_paths())?;
            EngineError::check_dimension("shock points", anchor.n_points(), draws.n_points())?;
        }

        let n_paths = anchor.n_paths();
        let n_points = anchor.n_points();
        // Mixed rows laid out per scenario as [point][cholesky factor]
        let mut mixed = vec![0.0; n_paths * n_points * N_FACTORS];
        mixed
            .par_chunks_exact_mut(n_points * N_FACTORS)
            .enumerate()
            .for_each(|(k, out)| {
                let mut z = [0.0; N_FACTORS];
                for j in 1..n_points {
                    z[0] = anchor.get(k, j);
                    for (slot, draws) in z[1..].iter_mut().zip(&independent.draws) {
                        *slot = draws.get(k, j);
                    }
                    self.cholesky
                        .transform_into(&z, &mut out[j * N_FACTORS..(j + 1) * N_FACTORS]);
                }
            });

        let mut factors = vec![PathMatrix::zeros(n_paths, n_points); N_FACTORS];
        for (c, factor) in RiskFactor::CHOLESKY_ORDER.iter().enumerate() {
            let target = &mut factors[factor.canonical_index()];
            for (k, row) in target.rows_mut().enumerate() {
                let block = &mixed[k * n_points * N_FACTORS..(k + 1) * n_points * N_FACTORS];
                for (j, value) in row.iter_mut().enumerate() {
                    *value = block[j * N_FACTORS + c];
                }
            }
        }
        Ok(ShockTensor { factors })
    }

    /// Draw the independent factors and mix them with `anchor`.
    ///
    /// # Errors
    /// See [`CorrelationEngine::mix`].
    pub fn correlate(&self, anchor: &PathMatrix, rng: &mut ScenarioRng) -> Result<ShockTensor, EngineError> {
        let n_steps = anchor.n_points().saturating_sub(1);
        let independent = self.draw_independent(rng, anchor.n_paths(), n_steps);
        self.mix(anchor, &independent)
    }

    /// Realised correlation of `shocks` against the target.
    pub fn verify(&self, shocks: &ShockTensor) -> CorrelationCheck {
        verify_correlation(shocks, &self.correlation)
    }
}

/// Realised against target correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationCheck {
    /// Realised correlation in canonical order
    pub realised: [[f64; N_FACTORS]; N_FACTORS],
    /// Target correlation in canonical order
    pub target: [[f64; N_FACTORS]; N_FACTORS],
    /// Largest absolute difference
    pub max_abs_error: f64,
}

/// Pooled sample correlation of every factor pair over all scenarios and
/// steps (slot 0 excluded), compared with `target`.
pub fn verify_correlation(shocks: &ShockTensor, target: &FactorCorrelation) -> CorrelationCheck {
    let pooled: Vec<Vec<f64>> = RiskFactor::CANONICAL_ORDER
        .iter()
        .map(|&f| {
            shocks
                .factor(f)
                .rows()
                .flat_map(|row| row[1..].iter().copied())
                .collect()
        })
        .collect();

    let mut realised = [[0.0; N_FACTORS]; N_FACTORS];
    let mut expected = [[0.0; N_FACTORS]; N_FACTORS];
    let mut max_abs_error = 0.0_f64;
    for (i, &a) in RiskFactor::CANONICAL_ORDER.iter().enumerate() {
        for (j, &b) in RiskFactor::CANONICAL_ORDER.iter().enumerate() {
            let rho = if i == j {
                1.0
            } else {
                statistics::correlation(&pooled[i], &pooled[j]).unwrap_or(f64::NAN)
            };
            realised[i][j] = rho;
            expected[i][j] = target.get(a, b);
            max_abs_error = max_abs_error.max((rho - expected[i][j]).abs());
        }
    }
    CorrelationCheck {
        realised,
        target: expected,
        max_abs_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_non_positive_definite_is_calibration_error() {
        let mut rows = *FactorCorrelation::ahlgrim_2005().cholesky_rows();
        rows[1][2] = 1.5;
        rows[2][1] = 1.5;
        let err = CorrelationEngine::new(&FactorCorrelation::from_cholesky_rows(rows)).unwrap_err();
        assert!(matches!(err, CalibrationError::Correlation(_)));
    }

    #[test]
    fn test_anchor_passes_through() {
        let engine = CorrelationEngine::new(&FactorCorrelation::ahlgrim_2005()).unwrap();
        let mut rng = ScenarioRng::from_seed(3);
        let anchor = rng.antithetic_matrix(6, 10);
        let shocks = engine.correlate(&anchor, &mut rng).unwrap();
        assert_eq!(shocks.factor(RiskFactor::ShortRate), &anchor);
        assert_eq!(shocks.n_scenarios(), 6);
        assert_eq!(shocks.n_points(), 11);
        for factor in RiskFactor::CANONICAL_ORDER {
            assert_eq!(shocks.get(factor, 2, 0), 0.0);
        }
    }

    #[test]
    fn test_realised_correlation_matches_target() {
        let target = FactorCorrelation::ahlgrim_2005();
        let engine = CorrelationEngine::new(&target).unwrap();
        let mut rng = ScenarioRng::from_seed(42);
        let anchor = rng.antithetic_matrix(400, 100);
        let shocks = engine.correlate(&anchor, &mut rng).unwrap();
        let check = engine.verify(&shocks);
        assert!(check.max_abs_error < 0.03, "max error {}", check.max_abs_error);
        assert_relative_eq!(check.realised[2][3], 0.80, epsilon = 0.03);
        assert_eq!(check.target[2][3], 0.80);
    }

    #[test]
    fn test_dimension_mismatch() {
        let engine = CorrelationEngine::new(&FactorCorrelation::default()).unwrap();
        let mut rng = ScenarioRng::from_seed(1);
        let independent = engine.draw_independent(&mut rng, 4, 5);
        let anchor = PathMatrix::zeros(4, 7);
        assert!(engine.mix(&anchor, &independent).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_independent_draws_are_antithetic(seed in any::<u64>(), half in 1usize..10) {
            let engine = CorrelationEngine::new(&FactorCorrelation::stress()).unwrap();
            let mut rng = ScenarioRng::from_seed(seed);
            let independent = engine.draw_independent(&mut rng, 2 * half, 8);
            prop_assert!(independent.factor(RiskFactor::ShortRate).is_none());
            for factor in &RiskFactor::CHOLESKY_ORDER[1..] {
                let draws = independent.factor(*factor).unwrap();
                for k in 0..half {
                    for j in 0..9 {
                        prop_assert_eq!(draws.get(k + half, j), -draws.get(k, j));
                    }
                }
            }
        }

        #[test]
        fn test_mixed_shocks_inherit_antithetic_pairs(seed in any::<u64>()) {
            let engine = CorrelationEngine::new(&FactorCorrelation::conservative()).unwrap();
            let mut rng = ScenarioRng::from_seed(seed);
            let anchor = rng.antithetic_matrix(8, 6);
            let shocks = engine.correlate(&anchor, &mut rng).unwrap();
            for factor in RiskFactor::CANONICAL_ORDER {
                for k in 0..4 {
                    for j in 1..7 {
                        let a = shocks.get(factor, k, j);
                        let b = shocks.get(factor, k + 4, j);
                        prop_assert!((a + b).abs() < 1e-12);
                    }
                }
            }
        }
    }
}
