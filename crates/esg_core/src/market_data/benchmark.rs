//! Benchmark term structure input.
//!
//! A [`BenchmarkCurve`] is the ordered list of `(maturity year, annual rate)`
//! pillars of one reference market and date. Rates are annually compounded,
//! so the zero-coupon price of pillar `n` is `(1 + r_n)^{-n}`.

use super::MarketDataError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Single curve pillar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Maturity in whole years
    pub maturity: u32,
    /// Annually compounded rate for that maturity
    pub rate: f64,
}

/// Validated benchmark curve, immutable after construction.
///
/// # Example
///
/// ```
/// use esg_core::market_data::BenchmarkCurve;
///
/// let curve = BenchmarkCurve::new(vec![(1, 0.010), (2, 0.012), (3, 0.015), (5, 0.018)]).unwrap();
/// assert_eq!(curve.max_maturity(), 5);
/// let p2 = curve.zero_prices()[1];
/// assert!((p2 - 1.012_f64.powi(-2)).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkCurve {
    points: Vec<CurvePoint>,
    #[serde(default)]
    reference_date: Option<NaiveDate>,
}

impl BenchmarkCurve {
    /// Build a curve from `(maturity, rate)` pairs.
    ///
    /// # Errors
    ///
    /// - `InsufficientData` if no pillars are given
    /// - `InvalidMaturity` for a zero maturity
    /// - `NonIncreasingMaturity` if maturities are not strictly increasing
    /// - `InvalidRate` for a non-finite rate or a rate `<= -1`
    pub fn new(pillars: Vec<(u32, f64)>) -> Result<Self, MarketDataError> {
        let points = pillars
            .into_iter()
            .map(|(maturity, rate)| CurvePoint { maturity, rate })
            .collect();
        Self::from_points(points)
    }

    /// Build a curve from already-formed pillars.
    pub fn from_points(points: Vec<CurvePoint>) -> Result<Self, MarketDataError> {
        if points.is_empty() {
            return Err(MarketDataError::InsufficientData { got: 0, need: 1 });
        }
        for (index, point) in points.iter().enumerate() {
            if point.maturity == 0 {
                return Err(MarketDataError::InvalidMaturity {
                    maturity: point.maturity,
                });
            }
            if index > 0 && point.maturity <= points[index - 1].maturity {
                return Err(MarketDataError::NonIncreasingMaturity {
                    index,
                    maturity: point.maturity,
                });
            }
            if !point.rate.is_finite() || point.rate <= -1.0 {
                return Err(MarketDataError::InvalidRate {
                    index,
                    rate: point.rate,
                });
            }
        }
        Ok(Self {
            points,
            reference_date: None,
        })
    }

    /// Flat curve with the same rate for maturities `1..=years`.
    pub fn flat(rate: f64, years: u32) -> Result<Self, MarketDataError> {
        Self::new((1..=years).map(|m| (m, rate)).collect())
    }

    /// Recover annual rates from zero-coupon prices, `r = P^{-1/T} - 1`.
    ///
    /// # Errors
    ///
    /// `InvalidPrice` for a non-positive or non-finite price, plus the
    /// maturity checks of [`BenchmarkCurve::new`].
    pub fn from_zero_prices(prices: &[(u32, f64)]) -> Result<Self, MarketDataError> {
        let mut pillars = Vec::with_capacity(prices.len());
        for (index, &(maturity, price)) in prices.iter().enumerate() {
            if !price.is_finite() || price <= 0.0 {
                return Err(MarketDataError::InvalidPrice { index, price });
            }
            if maturity == 0 {
                return Err(MarketDataError::InvalidMaturity { maturity });
            }
            pillars.push((maturity, price.powf(-1.0 / f64::from(maturity)) - 1.0));
        }
        Self::new(pillars)
    }

    /// Attach the calibration date.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Calibration date, if known.
    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.reference_date
    }

    /// Pillars in maturity order.
    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Number of pillars.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a validated curve.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Longest pillar maturity in years.
    pub fn max_maturity(&self) -> u32 {
        self.points.last().map_or(0, |p| p.maturity)
    }

    /// Pillar maturities as years.
    pub fn maturities(&self) -> Vec<f64> {
        self.points.iter().map(|p| f64::from(p.maturity)).collect()
    }

    /// Zero-coupon prices `(1 + r_n)^{-n}` at each pillar (without the `t = 0` point).
    pub fn zero_prices(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| (1.0 + p.rate).powf(-f64::from(p.maturity)))
            .collect()
    }
}

/// Nelson-Siegel yield for maturity `m`:
/// `β0 + β1·g(m) + β2·(g(m) - e^{-m/λ})` with `g(m) = (1 - e^{-m/λ})/(m/λ)`.
///
/// # Errors
///
/// `InvalidParameter` for a non-positive decay `λ`.
pub fn nelson_siegel(
    maturities: &[u32],
    beta0: f64,
    beta1: f64,
    beta2: f64,
    lambda: f64,
) -> Result<BenchmarkCurve, MarketDataError> {
    if !(lambda > 0.0) {
        return Err(MarketDataError::InvalidParameter {
            name: "lambda",
            value: lambda,
        });
    }
    let pillars = maturities
        .iter()
        .map(|&m| {
            let x = f64::from(m) / lambda;
            let decay = (-x).exp();
            let g = (1.0 - decay) / x;
            (m, beta0 + beta1 * g + beta2 * (g - decay))
        })
        .collect();
    BenchmarkCurve::new(pillars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_curve() {
        let curve = BenchmarkCurve::flat(0.02, 30).unwrap();
        assert_eq!(curve.len(), 30);
        assert_eq!(curve.max_maturity(), 30);
        assert_relative_eq!(curve.zero_prices()[9], 1.02_f64.powi(-10), epsilon = 1e-15);
    }

    #[test]
    fn test_rejects_non_increasing_maturities() {
        let err = BenchmarkCurve::new(vec![(1, 0.01), (3, 0.01), (2, 0.01)]).unwrap_err();
        assert_eq!(
            err,
            MarketDataError::NonIncreasingMaturity {
                index: 2,
                maturity: 2
            }
        );
    }

    #[test]
    fn test_rejects_invalid_rates() {
        assert!(BenchmarkCurve::new(vec![(1, -1.0)]).is_err());
        assert!(BenchmarkCurve::new(vec![(1, f64::NAN)]).is_err());
        assert!(BenchmarkCurve::new(vec![(0, 0.01)]).is_err());
        assert!(BenchmarkCurve::new(vec![]).is_err());
    }

    #[test]
    fn test_zero_price_round_trip() {
        let curve = BenchmarkCurve::new(vec![(1, 0.01), (2, 0.015), (4, 0.02)]).unwrap();
        let prices: Vec<(u32, f64)> = curve
            .points()
            .iter()
            .zip(curve.zero_prices())
            .map(|(p, price)| (p.maturity, price))
            .collect();
        let rebuilt = BenchmarkCurve::from_zero_prices(&prices).unwrap();
        for (a, b) in rebuilt.points().iter().zip(curve.points()) {
            assert_relative_eq!(a.rate, b.rate, epsilon = 1e-12);
        }
        assert!(BenchmarkCurve::from_zero_prices(&[(1, 0.0)]).is_err());
    }

    #[test]
    fn test_nelson_siegel_limits() {
        // Long end tends to beta0, short end to beta0 + beta1
        let curve = nelson_siegel(&[1, 100], 0.04, -0.02, 0.0, 2.0).unwrap();
        let short = curve.points()[0].rate;
        let long = curve.points()[1].rate;
        assert!(short < long);
        assert_relative_eq!(long, 0.04 - 0.02 * 0.02, epsilon = 1e-6);
        assert!(nelson_siegel(&[1], 0.04, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_reference_date_round_trips_through_serde() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let curve = BenchmarkCurve::flat(0.03, 3)
            .unwrap()
            .with_reference_date(date);
        assert_eq!(curve.reference_date(), Some(date));
    }
}
