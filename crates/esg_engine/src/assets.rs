//! Asset-class returns built on the cleaned rate paths and correlated shocks.
//!
//! Every series is a flow on the fine grid (slot 0 zero) split into a total,
//! price and income log-return with `total = price + income`:
//!
//! - cash earns the integrated short rate as income
//! - equity follows [`EquityParams::step`] on the equity shock
//! - real estate follows [`RealEstateParams`] with the auxiliary rate driven
//!   by the inflation shock and the price by the real-estate shock

use esg_models::models::equity::EquityParams;
use esg_models::models::hybrid::RiskFactor;
use esg_models::models::real_estate::RealEstateParams;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::paths::PathMatrix;
use crate::shocks::ShockTensor;
use crate::simulator::CurveGrid;

/// Total, price and income log-returns of one asset class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetReturns {
    /// Price plus income
    pub total: PathMatrix,
    /// Capital return
    pub price: PathMatrix,
    /// Dividend or rental income
    pub income: PathMatrix,
}

impl AssetReturns {
    fn zeros(n_paths: usize, n_points: usize) -> Self {
        Self {
            total: PathMatrix::zeros(n_paths, n_points),
            price: PathMatrix::zeros(n_paths, n_points),
            income: PathMatrix::zeros(n_paths, n_points),
        }
    }

    /// Number of scenarios.
    pub fn n_scenarios(&self) -> usize {
        self.total.n_paths()
    }

    /// Reporting-step returns (interval sums every `stride` points).
    pub fn downsample(&self, stride: usize) -> Self {
        Self {
            total: self.total.downsample_flow(stride),
            price: self.price.downsample_flow(stride),
            income: self.income.downsample_flow(stride),
        }
    }
}

/// Cash returns: the integrated rate is all income.
pub fn cash_returns(integrated_rate: &PathMatrix) -> AssetReturns {
    AssetReturns {
        total: integrated_rate.clone(),
        price: PathMatrix::zeros(integrated_rate.n_paths(), integrated_rate.n_points()),
        income: integrated_rate.clone(),
    }
}

/// Equity returns over `integrated_rate` with the equity slice of `shocks`.
///
/// # Errors
/// `DimensionMismatch` when the shocks and rates differ in shape.
pub fn equity_returns(
    params: &EquityParams,
    dt: f64,
    integrated_rate: &PathMatrix,
    shocks: &ShockTensor,
    real_world: bool,
) -> Result<AssetReturns, EngineError> {
    check_shape(integrated_rate, shocks)?;
    let (n_paths, n_points) = (integrated_rate.n_paths(), integrated_rate.n_points());
    let eps = shocks.factor(RiskFactor::Equity);
    let mut out = AssetReturns::zeros(n_paths, n_points);
    let AssetReturns { total, price, income } = &mut out;

    total
        .par_rows_mut()
        .zip(price.par_rows_mut())
        .zip(income.par_rows_mut())
        .zip(integrated_rate.as_slice().par_chunks_exact(n_points))
        .zip(eps.as_slice().par_chunks_exact(n_points))
        .for_each(|((((total, price), income), big_r), z)| {
            for j in 1..n_points {
                let step = params.step(big_r[j], dt, z[j], real_world);
                total[j] = step.total;
                price[j] = step.price;
                income[j] = step.dividend;
            }
        });
    Ok(out)
}

/// Real-estate returns against the initial curve with the inflation and
/// real-estate slices of `shocks`.
///
/// # Errors
/// - `Model` when the drift cannot be solved on the curve
/// - `DimensionMismatch` when the curve or shocks do not match
pub fn real_estate_returns(
    params: &RealEstateParams,
    curve: &CurveGrid,
    shocks: &ShockTensor,
    real_world: bool,
) -> Result<AssetReturns, EngineError> {
    let n_points = shocks.n_points();
    EngineError::check_dimension("real-estate curve points", n_points, curve.len())?;
    let dt = curve.dt();
    let drift = params.solve_drift(dt, curve.p0t(), curve.f0t(), real_world)?;
    let coeff = params.coefficients(dt);
    let rental: Vec<f64> = (0..n_points - 1).map(|i| params.rental_return(i, dt)).collect();
    let f0t = curve.f0t();

    let n_paths = shocks.n_scenarios();
    let z_infl = shocks.factor(RiskFactor::Inflation);
    let z_re = shocks.factor(RiskFactor::RealEstate);
    let mut out = AssetReturns::zeros(n_paths, n_points);
    let AssetReturns { total, price, income } = &mut out;

    total
        .par_rows_mut()
        .zip(price.par_rows_mut())
        .zip(income.par_rows_mut())
        .zip(z_infl.as_slice().par_chunks_exact(n_points))
        .zip(z_re.as_slice().par_chunks_exact(n_points))
        .for_each(|((((total, price), income), z_infl), z_re)| {
            let mut r2 = f0t[0];
            for i in 0..n_points - 1 {
                let p = coeff.price_return(drift[i], dt, r2, f0t[i], z_re[i + 1]);
                price[i + 1] = p;
                income[i + 1] = rental[i];
                total[i + 1] = p + rental[i];
                r2 = coeff.aux_step(r2, f0t[i], z_infl[i + 1]);
            }
        });
    Ok(out)
}

fn check_shape(rates: &PathMatrix, shocks: &ShockTensor) -> Result<(), EngineError> {
    EngineError::check_dimension("shock scenarios", rates.n_paths(), shocks.n_scenarios())?;
    EngineError::check_dimension("shock points", rates.n_points(), shocks.n_points())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::rng::ScenarioRng;
    use crate::shocks::CorrelationEngine;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use esg_models::models::hybrid::FactorCorrelation;

    fn shocks(n_paths: usize, n_steps: usize, seed: u64) -> ShockTensor {
        let engine = CorrelationEngine::new(&FactorCorrelation::default()).unwrap();
        let mut rng = ScenarioRng::from_seed(seed);
        let anchor = rng.antithetic_matrix(n_paths, n_steps);
        engine.correlate(&anchor, &mut rng).unwrap()
    }

    #[test]
    fn test_cash_is_income() {
        let rates = PathMatrix::from_vec(1, 3, vec![0.0, 0.01, 0.02]);
        let cash = cash_returns(&rates);
        assert_eq!(cash.total, rates);
        assert_eq!(cash.income, rates);
        assert_eq!(cash.price.row(0), &[0.0; 3]);
    }

    #[test]
    fn test_equity_split_and_measure() {
        let shocks = shocks(4, 10, 5);
        let rates = PathMatrix::from_vec(4, 11, vec![0.001; 44]);
        let params = EquityParams::default();
        let rn = equity_returns(&params, 0.1, &rates, &shocks, false).unwrap();
        let rw = equity_returns(&params, 0.1, &rates, &shocks, true).unwrap();
        for k in 0..4 {
            assert_eq!(rn.total.get(k, 0), 0.0);
            for j in 1..11 {
                assert_relative_eq!(
                    rn.total.get(k, j),
                    rn.price.get(k, j) + rn.income.get(k, j),
                    epsilon = 1e-15
                );
                assert_relative_eq!(
                    rw.total.get(k, j) - rn.total.get(k, j),
                    params.risk_premium * 0.1,
                    epsilon = 1e-12
                );
                assert_relative_eq!(rn.income.get(k, j), 0.02_f64.ln_1p() * 0.1, epsilon = 1e-15);
            }
        }
    }

    #[test]
    fn test_equity_shape_mismatch() {
        let shocks = shocks(4, 10, 5);
        let rates = PathMatrix::zeros(4, 12);
        assert!(equity_returns(&EquityParams::default(), 0.1, &rates, &shocks, false).is_err());
    }

    #[test]
    fn test_real_estate_martingale() {
        let grid = GenerationConfig::default()
            .with_time_grid(5.0, 0.05, 1.0)
            .time_grid()
            .unwrap();
        let curve = CurveGrid::flat(0.03, &grid);
        let shocks = shocks(4000, grid.n_steps, 11);
        let params = RealEstateParams::default();
        let returns = real_estate_returns(&params, &curve, &shocks, false).unwrap();

        // every step earns the curve's one-step return in expectation
        let step_growth = returns.total.map(f64::exp).column_means();
        for i in [0, grid.n_steps / 2, grid.n_steps - 1] {
            let target = curve.p0t()[i] / curve.p0t()[i + 1];
            assert_relative_eq!(step_growth[i + 1], target, max_relative = 2e-3);
        }

        let rental = returns.income.get(0, 1);
        assert_abs_diff_eq!(rental, params.rental_yield.ln_1p() * 0.05, epsilon = 1e-15);
    }

    #[test]
    fn test_real_estate_downsample_preserves_sum() {
        let grid = GenerationConfig::default()
            .with_time_grid(2.0, 0.1, 1.0)
            .time_grid()
            .unwrap();
        let shocks = shocks(2, grid.n_steps, 2);
        let returns =
            real_estate_returns(&RealEstateParams::default(), &CurveGrid::flat(0.02, &grid), &shocks, true)
                .unwrap();
        let coarse = returns.downsample(grid.stride);
        assert_eq!(coarse.total.n_points(), 3);
        let fine_sum: f64 = returns.total.row(1).iter().sum();
        let coarse_sum: f64 = coarse.total.row(1).iter().sum();
        assert_relative_eq!(fine_sum, coarse_sum, epsilon = 1e-12);
    }
}
