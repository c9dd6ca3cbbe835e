//! Rejection of scenarios with implausible interest rates.
//!
//! The bounds are simple annual rates converted to continuous rates with
//! `ln(1 + lim)`. A scenario breaches when, in either measure, the integrated
//! rate over some reporting interval divided by the interval length falls
//! outside `[ln(1 + lim_low), ln(1 + lim_high)]`.
//!
//! If more than `abandon_fraction · N` scenarios breach, the filter is
//! abandoned and the batch is kept whole. Otherwise breaching scenarios are
//! dropped and replacements are simulated in antithetic pairs until exactly
//! `N` survive. The rounds are sequential; the replacement batch of a round
//! is simulated in parallel like any other.

use serde::{Deserialize, Serialize};

use crate::config::{FilterConfig, TimeGrid};
use crate::error::EngineError;
use crate::paths::PathMatrix;
use crate::simulator::RateScenarios;

/// What the filter did to a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FilterOutcome {
    /// The batch holds exactly `N` scenarios within bounds.
    Exact {
        /// Scenarios rejected, regenerated ones included
        removed: usize,
        /// Regeneration rounds performed
        rounds: usize,
    },
    /// Too many breaches: the unfiltered batch was kept.
    Abandoned {
        /// Scenarios of the first batch that breached
        breached: usize,
    },
    /// Filtering was switched off.
    Disabled,
}

impl FilterOutcome {
    /// Whether the filter was abandoned.
    pub fn is_abandoned(&self) -> bool {
        matches!(self, FilterOutcome::Abandoned { .. })
    }

    /// Scenarios rejected (breached for an abandoned filter).
    pub fn removed(&self) -> usize {
        match *self {
            FilterOutcome::Exact { removed, .. } => removed,
            FilterOutcome::Abandoned { breached } => breached,
            FilterOutcome::Disabled => 0,
        }
    }

    /// Regeneration rounds performed.
    pub fn rounds(&self) -> usize {
        match *self {
            FilterOutcome::Exact { rounds, .. } => rounds,
            _ => 0,
        }
    }
}

/// Bound checks and the regeneration loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathFilter {
    upper: f64,
    lower: f64,
    abandon_fraction: f64,
    max_iterations: usize,
    stride: usize,
    dt_report: f64,
}

impl PathFilter {
    /// Filter for reporting intervals of `grid`.
    pub fn new(config: &FilterConfig, grid: &TimeGrid) -> Self {
        Self {
            upper: config.lim_high.ln_1p(),
            lower: config.lim_low.ln_1p(),
            abandon_fraction: config.abandon_fraction,
            max_iterations: config.max_iterations,
            stride: grid.stride,
            dt_report: grid.dt_report,
        }
    }

    /// Continuous-rate bounds `(lower, upper)`.
    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Whether one row of integrated rates leaves the bounds over some
    /// reporting interval.
    fn row_breaches(&self, integrated: &[f64]) -> bool {
        integrated[1..].chunks(self.stride).any(|interval| {
            let annualised = interval.iter().sum::<f64>() / self.dt_report;
            !(annualised >= self.lower && annualised <= self.upper)
        })
    }

    fn matrix_breaches(&self, integrated: &PathMatrix, flags: &mut [bool]) {
        for (flag, row) in flags.iter_mut().zip(integrated.rows()) {
            *flag = *flag || self.row_breaches(row);
        }
    }

    /// Indices of scenarios breaching in either measure, ascending.
    pub fn breaches(&self, paths: &RateScenarios) -> Vec<usize> {
        let mut flags = vec![false; paths.len()];
        self.matrix_breaches(&paths.integrated_rate, &mut flags);
        self.matrix_breaches(&paths.integrated_rate_rw, &mut flags);
        flags
            .iter()
            .enumerate()
            .filter_map(|(i, &breach)| breach.then_some(i))
            .collect()
    }

    /// Indices of scenarios within bounds, ascending.
    pub fn survivors(&self, paths: &RateScenarios) -> Vec<usize> {
        let breached = self.breaches(paths);
        let mut next = breached.iter().peekable();
        (0..paths.len())
            .filter(|i| {
                if next.peek() == Some(&i) {
                    next.next();
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    /// Filter `paths` to exactly `target` scenarios.
    ///
    /// `regenerate(n)` simulates `n` fresh scenarios (always even) and is
    /// called once per round.
    ///
    /// # Errors
    /// - `ScenarioCountMismatch` when `max_iterations` rounds do not assemble `target`
    /// - whatever `regenerate` returns
    pub fn apply<F>(
        &self,
        paths: RateScenarios,
        target: usize,
        mut regenerate: F,
    ) -> Result<(RateScenarios, FilterOutcome), EngineError>
    where
        F: FnMut(usize) -> Result<RateScenarios, EngineError>,
    {
        let breached = self.breaches(&paths);
        if breached.len() as f64 > self.abandon_fraction * target as f64 {
            tracing::warn!(
                breached = breached.len(),
                target,
                lower = self.lower,
                upper = self.upper,
                "path explosion: rate filter abandoned, keeping the unfiltered batch"
            );
            return Ok((
                paths,
                FilterOutcome::Abandoned {
                    breached: breached.len(),
                },
            ));
        }

        let mut removed = breached.len();
        let mut kept = paths.select(&self.survivors(&paths));
        kept.truncate(target);
        let mut rounds = 0;
        while kept.len() < target {
            if rounds == self.max_iterations {
                return Err(EngineError::ScenarioCountMismatch {
                    target,
                    assembled: kept.len(),
                    iterations: rounds,
                });
            }
            rounds += 1;
            let shortfall = target - kept.len();
            let fresh = regenerate(2 * shortfall.div_ceil(2))?;
            let survivors = self.survivors(&fresh);
            removed += fresh.len() - survivors.len();
            let mut accepted = fresh.select(&survivors);
            accepted.truncate(shortfall);
            kept.append(&accepted);
            tracing::debug!(
                round = rounds,
                shortfall,
                accepted = accepted.len(),
                "regenerated rejected scenarios"
            );
        }

        if removed > 0 {
            tracing::warn!(removed, rounds, target, "rate filter replaced breaching scenarios");
        }
        Ok((kept, FilterOutcome::Exact { removed, rounds }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::rng::ScenarioRng;
    use crate::simulator::{CurveGrid, HullWhiteSimulator};
    use esg_models::models::rates::{HullWhiteParams, RiskPremiumParams};
    use proptest::prelude::*;

    fn setup(sigma: f64, lim_low: f64, lim_high: f64) -> (HullWhiteSimulator, PathFilter) {
        let config = GenerationConfig::default()
            .with_time_grid(10.0, 0.05, 1.0)
            .with_bounds(lim_low, lim_high);
        let grid = config.time_grid().unwrap();
        let sim = HullWhiteSimulator::new(
            HullWhiteParams::new(0.05, sigma).unwrap(),
            RiskPremiumParams::default(),
            grid,
            CurveGrid::flat(0.02, &grid),
        )
        .unwrap();
        (sim, PathFilter::new(&config.filter, &grid))
    }

    fn constant_paths(rates: &[f64], n_points: usize, dt: f64) -> RateScenarios {
        let mut integrated = PathMatrix::zeros(rates.len(), n_points);
        for (k, &r) in rates.iter().enumerate() {
            for v in &mut integrated.row_mut(k)[1..] {
                *v = r * dt;
            }
        }
        RateScenarios {
            short_rate: PathMatrix::zeros(rates.len(), n_points),
            integrated_rate: integrated.clone(),
            risk_premium: PathMatrix::zeros(rates.len(), n_points),
            short_rate_rw: PathMatrix::zeros(rates.len(), n_points),
            integrated_rate_rw: integrated,
        }
    }

    /// Smallest and largest annualised interval rate over both measures.
    fn interval_extremes(paths: &RateScenarios, grid: &TimeGrid) -> (f64, f64) {
        [&paths.integrated_rate, &paths.integrated_rate_rw]
            .into_iter()
            .flat_map(|m| m.rows())
            .flat_map(|row| row[1..].chunks(grid.stride))
            .map(|interval| interval.iter().sum::<f64>() / grid.dt_report)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }

    #[test]
    fn test_bounds_outside_extremes_remove_nothing() {
        let (sim, _) = setup(0.01, -0.05, 0.10);
        let grid = *sim.grid();
        let paths = sim.simulate(200, &mut ScenarioRng::from_seed(5));
        let (lo, hi) = interval_extremes(&paths, &grid);
        let margin = 1e-9;

        let config = GenerationConfig::default()
            .with_time_grid(10.0, 0.05, 1.0)
            .with_bounds((lo - margin).exp_m1(), (hi + margin).exp_m1());
        let filter = PathFilter::new(&config.filter, &grid);
        let (kept, outcome) = filter
            .apply(paths.clone(), 200, |_| panic!("every scenario is within bounds"))
            .unwrap();
        assert_eq!(outcome, FilterOutcome::Exact { removed: 0, rounds: 0 });
        assert_eq!(kept, paths);

        // An upper bound just below the maximum catches its scenario
        let config = config.with_bounds((lo - margin).exp_m1(), (hi - margin).exp_m1());
        let filter = PathFilter::new(&config.filter, &grid);
        assert!(!filter.breaches(&paths).is_empty());
    }

    #[test]
    fn test_bounds_are_continuous() {
        let (_, filter) = setup(0.01, -0.05, 0.10);
        let (lower, upper) = filter.bounds();
        assert!((upper - 1.1_f64.ln()).abs() < 1e-15);
        assert!((lower - 0.95_f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn test_breach_detection() {
        let (_, filter) = setup(0.01, -0.05, 0.10);
        let paths = constant_paths(&[0.02, 0.12, -0.06, 0.09], 201, 0.05);
        assert_eq!(filter.breaches(&paths), vec![1, 2]);
        assert_eq!(filter.survivors(&paths), vec![0, 3]);
    }

    #[test]
    fn test_real_world_breach_counts() {
        let (_, filter) = setup(0.01, -0.05, 0.10);
        let mut paths = constant_paths(&[0.02, 0.02], 201, 0.05);
        paths.integrated_rate_rw.set(1, 57, 0.2);
        assert_eq!(filter.breaches(&paths), vec![1]);
    }

    #[test]
    fn test_regeneration_reaches_target() {
        let (sim, filter) = setup(0.02, -0.05, 0.10);
        let mut rng = ScenarioRng::from_seed(11);
        let paths = sim.simulate(200, &mut rng);
        let initial_breaches = filter.breaches(&paths).len();
        assert!(initial_breaches > 0);

        let mut calls = Vec::new();
        let (kept, outcome) = filter
            .apply(paths, 200, |n| {
                calls.push(n);
                Ok(sim.simulate(n, &mut rng))
            })
            .unwrap();
        assert_eq!(kept.len(), 200);
        assert!(filter.breaches(&kept).is_empty());
        assert!(calls.iter().all(|n| n % 2 == 0));
        match outcome {
            FilterOutcome::Exact { removed, rounds } => {
                assert!(removed >= initial_breaches);
                assert_eq!(rounds, calls.len());
            }
            other => panic!("expected exact outcome, got {other:?}"),
        }
    }

    #[test]
    fn test_abandonment_keeps_batch() {
        let (sim, filter) = setup(0.01, -0.05, 0.001);
        let paths = sim.simulate(100, &mut ScenarioRng::from_seed(1));
        let (kept, outcome) = filter
            .apply(paths.clone(), 100, |_| panic!("no regeneration after abandonment"))
            .unwrap();
        assert!(outcome.is_abandoned());
        assert!(outcome.removed() > 50);
        assert_eq!(kept, paths);
    }

    #[test]
    fn test_count_mismatch_after_max_iterations() {
        let config = GenerationConfig::default().with_time_grid(10.0, 0.05, 1.0);
        let grid = config.time_grid().unwrap();
        let mut filter_config = config.filter;
        filter_config.max_iterations = 3;
        let filter = PathFilter::new(&filter_config, &grid);

        let good = constant_paths(&[0.02, 0.02, 0.02, 0.5], 201, 0.05);
        let bad = constant_paths(&[0.5, 0.5], 201, 0.05);
        let err = filter.apply(good, 4, |_| Ok(bad.clone())).unwrap_err();
        assert_eq!(
            err,
            EngineError::ScenarioCountMismatch {
                target: 4,
                assembled: 3,
                iterations: 3
            }
        );
    }

    #[test]
    fn test_regenerate_error_propagates() {
        let (_, filter) = setup(0.01, -0.05, 0.10);
        let paths = constant_paths(&[0.02, 0.5], 201, 0.05);
        let err = filter
            .apply(paths, 2, |_| Err(EngineError::MissingHullWhiteParameters))
            .unwrap_err();
        assert_eq!(err, EngineError::MissingHullWhiteParameters);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn test_filter_is_idempotent(seed in any::<u64>()) {
            let (sim, filter) = setup(0.015, -0.05, 0.10);
            let mut rng = ScenarioRng::from_seed(seed);
            let paths = sim.simulate(40, &mut rng);
            let (kept, _) = filter.apply(paths, 40, |n| Ok(sim.simulate(n, &mut rng))).unwrap();
            let (again, outcome) = filter
                .apply(kept.clone(), 40, |_| panic!("nothing to regenerate"))
                .unwrap();
            prop_assert_eq!(outcome, FilterOutcome::Exact { removed: 0, rounds: 0 });
            prop_assert_eq!(again, kept);
        }
    }
}
