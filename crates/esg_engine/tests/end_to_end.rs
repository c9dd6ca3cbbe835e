//! End-to-end generation runs.
//!
//! # Test Coverage
//!
//! - Flat 2% curve: mean deflator at the horizon against the curve, a
//!   Gaussian-tail rejection rate below 1%
//! - Narrow upper bound: filter abandonment with the path-explosion flag
//! - Antithetic shocks, filter idempotence and correlation validation
//!   through the public API

use approx::assert_abs_diff_eq;
use esg_core::market_data::BenchmarkCurve;
use esg_engine::{
    CorrelationEngine, EngineError, FilterOutcome, GenerationConfig, Measure, PathFilter, ScenarioGenerator,
    ScenarioRng,
};
use esg_models::calibration::CalibrationError;
use esg_models::models::hybrid::{FactorCorrelation, RiskFactor};
use esg_models::models::rates::HullWhiteParams;

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Flat 2% for 30 years, a = 0.05, σ = 0.01, N = 1000, T = 10, dt = 0.01.
fn flat_config() -> GenerationConfig {
    GenerationConfig::default()
        .with_scenarios(1000)
        .with_time_grid(10.0, 0.01, 1.0)
        .with_hull_white(HullWhiteParams::new(0.05, 0.01).unwrap())
}

fn flat_benchmark() -> BenchmarkCurve {
    BenchmarkCurve::flat(0.02, 30).unwrap()
}

#[test]
fn e2e_flat_curve_deflators() {
    init_tracing();
    let generator = ScenarioGenerator::new(flat_config()).unwrap();
    let output = generator.generate(&flat_benchmark(), &[]).unwrap();
    let batch = &output.batch;

    assert_eq!(batch.n_scenarios(), 1000);
    assert_eq!(batch.report_times.len(), 11);
    assert!(!batch.path_explosion);
    assert!(!batch.filter.is_abandoned());

    let mean_df = batch.deflators(Measure::RiskNeutral).column_means();
    assert_eq!(mean_df[0], 1.0);
    assert_abs_diff_eq!(mean_df[10], (-0.2_f64).exp(), epsilon = 0.01);

    // At year 10 the short-rate std is about 0.025, so ln(0.95) sits near
    // 2.8σ below a 2% curve. A few tenths of a percent of the Gaussian paths
    // breach it in the risk-neutral measure already, so zero rejections is
    // not attainable for this model.
    let diagnostics = &output.diagnostics;
    assert!(matches!(batch.filter, FilterOutcome::Exact { .. }));
    assert!(
        diagnostics.rejection_fraction < 0.01,
        "rejection fraction {}",
        diagnostics.rejection_fraction
    );
    assert!(
        diagnostics.max_martingale_error() < 0.01,
        "martingale error {:?}",
        diagnostics.martingale_error
    );
    assert_eq!(diagnostics.hull_white.mean_reversion, 0.05);
    assert!(diagnostics.swaption.is_none());
}

#[test]
fn e2e_narrow_bounds_abandon_filter() {
    init_tracing();
    let config = flat_config().with_bounds(-0.05, 0.001);
    let generator = ScenarioGenerator::new(config).unwrap();
    let output = generator.generate(&flat_benchmark(), &[]).unwrap();

    assert!(output.batch.path_explosion);
    assert!(matches!(output.batch.filter, FilterOutcome::Abandoned { breached } if breached > 500));
    assert_eq!(output.batch.n_scenarios(), 1000);
    assert!(output.diagnostics.path_explosion);
    assert!(output.diagnostics.rejection_fraction > 0.5);
}

#[test]
fn e2e_filter_is_idempotent_on_generated_batch() {
    init_tracing();
    let config = flat_config().with_scenarios(200).with_time_grid(10.0, 0.05, 1.0);
    let grid = config.time_grid().unwrap();
    let generator = ScenarioGenerator::new(config.clone()).unwrap();
    let calibrated = generator.calibrate_curve(&flat_benchmark()).unwrap();
    let curve = esg_engine::CurveGrid::from_calibrated(&calibrated, &grid).unwrap();
    let simulator = esg_engine::HullWhiteSimulator::new(
        HullWhiteParams::new(0.05, 0.015).unwrap(),
        config.risk_premium,
        grid,
        curve,
    )
    .unwrap();

    let filter = PathFilter::new(&config.filter, &grid);
    let mut rng = ScenarioRng::from_seed(3);
    let paths = simulator.simulate(200, &mut rng);
    let (cleaned, outcome) = filter
        .apply(paths, 200, |n| Ok(simulator.simulate(n, &mut rng)))
        .unwrap();
    assert!(matches!(outcome, FilterOutcome::Exact { .. }));
    assert_eq!(cleaned.len(), 200);

    let (again, second) = filter
        .apply(cleaned.clone(), 200, |_| panic!("nothing should be regenerated"))
        .unwrap();
    assert_eq!(second, FilterOutcome::Exact { removed: 0, rounds: 0 });
    assert_eq!(again, cleaned);
}

#[test]
fn e2e_independent_shocks_are_antithetic() {
    let engine = CorrelationEngine::new(&FactorCorrelation::ahlgrim_2005()).unwrap();
    let mut rng = ScenarioRng::from_seed(42);
    let draws = engine.draw_independent(&mut rng, 100, 50);
    for factor in [
        RiskFactor::Inflation,
        RiskFactor::RealEstate,
        RiskFactor::LongRate,
        RiskFactor::Equity,
    ] {
        let m = draws.factor(factor).unwrap();
        for k in 0..50 {
            for j in 0..=50 {
                assert_eq!(m.get(k + 50, j), -m.get(k, j));
            }
        }
    }
}

#[test]
fn e2e_non_positive_definite_correlation() {
    let mut rows = [[0.0; 5]; 5];
    for (i, row) in rows.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    rows[0][1] = 1.5;
    rows[1][0] = 1.5;
    let err = CorrelationEngine::new(&FactorCorrelation::from_cholesky_rows(rows)).unwrap_err();
    assert!(matches!(err, CalibrationError::Correlation(_)));

    let config = flat_config().with_correlation(FactorCorrelation::from_cholesky_rows(rows));
    assert!(matches!(ScenarioGenerator::new(config), Err(EngineError::Config(_))));
}
