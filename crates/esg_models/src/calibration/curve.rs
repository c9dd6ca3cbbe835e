//! Bootstrapping of the initial term structure.
//!
//! From a [`BenchmarkCurve`] of annual rates, [`CurveCalibrator`] builds
//! zero-coupon prices `P0t` and instantaneous forwards `f0t` on a regular grid
//! of step `dt`:
//!
//! 1. `P(0, n) = (1 + r_n)^{-n}` at each pillar, with `P(0, 0) = 1` prepended
//! 2. a natural cubic spline through the prices (not the log-prices) gives
//!    `P0t` on the grid
//! 3. `f0t = -d ln P0t / dt` by finite differences: forward at the first
//!    point, centred inside, backward at the last
//! 4. beyond `smoothing.start` years every forward is replaced by the mean of
//!    itself and the next `smoothing.window / dt` forwards; the last full
//!    window's value is held flat to the end of the grid

use chrono::NaiveDate;
use esg_core::market_data::BenchmarkCurve;
use esg_core::math::interpolators::{CubicSplineInterpolator, Interpolator};
use esg_core::types::InterpolationError;
use serde::{Deserialize, Serialize};

use super::CalibrationError;
use crate::models::rates::InitialCurve;

/// Minimum number of benchmark pillars for the spline.
pub const MIN_CURVE_POINTS: usize = 4;

/// Long-end forward smoothing settings, in years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveSmoothing {
    /// Maturity from which forwards are averaged
    pub start: f64,
    /// Length of the averaging window
    pub window: f64,
}

impl Default for CurveSmoothing {
    fn default() -> Self {
        Self {
            start: 60.0,
            window: 20.0,
        }
    }
}

/// Builds [`CalibratedCurve`]s on a fixed grid.
///
/// # Example
///
/// ```
/// use esg_core::market_data::BenchmarkCurve;
/// use esg_models::calibration::CurveCalibrator;
///
/// let benchmark = BenchmarkCurve::flat(0.02, 30).unwrap();
/// let curve = CurveCalibrator::new(0.01).unwrap().calibrate(&benchmark).unwrap();
/// assert_eq!(curve.p0t()[0], 1.0);
/// assert!((curve.discount(10.0).unwrap() - 1.02_f64.powi(-10)).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveCalibrator {
    dt: f64,
    smoothing: CurveSmoothing,
}

impl CurveCalibrator {
    /// Calibrator on a grid of step `dt` years with default smoothing.
    ///
    /// # Errors
    /// `InvalidSettings` for a non-positive or non-finite step.
    pub fn new(dt: f64) -> Result<Self, CalibrationError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(CalibrationError::invalid_settings(format!(
                "curve grid step must be positive, got {dt}"
            )));
        }
        Ok(Self {
            dt,
            smoothing: CurveSmoothing::default(),
        })
    }

    /// Replace the smoothing settings.
    pub fn with_smoothing(mut self, smoothing: CurveSmoothing) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Grid step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Smoothing settings.
    pub fn smoothing(&self) -> CurveSmoothing {
        self.smoothing
    }

    /// Bootstrap prices and forwards from the benchmark.
    ///
    /// # Errors
    /// - `InsufficientData` for fewer than four pillars
    /// - `InvalidSettings` for negative smoothing settings or a grid step
    ///   longer than the curve
    /// - `Interpolation` if the spline cannot be built
    pub fn calibrate(&self, benchmark: &BenchmarkCurve) -> Result<CalibratedCurve, CalibrationError> {
        if benchmark.len() < MIN_CURVE_POINTS {
            return Err(CalibrationError::insufficient_data(
                MIN_CURVE_POINTS,
                benchmark.len(),
            ));
        }
        if !(self.smoothing.start >= 0.0 && self.smoothing.window >= 0.0) {
            return Err(CalibrationError::invalid_settings(format!(
                "smoothing start and window must be non-negative, got {} and {}",
                self.smoothing.start, self.smoothing.window
            )));
        }

        let mut knots = Vec::with_capacity(benchmark.len() + 1);
        knots.push(0.0);
        knots.extend(benchmark.maturities());
        let mut prices = Vec::with_capacity(benchmark.len() + 1);
        prices.push(1.0);
        prices.extend(benchmark.zero_prices());

        let spline = CubicSplineInterpolator::new(&knots, &prices)?;

        let max_maturity = f64::from(benchmark.max_maturity());
        let n_grid = (max_maturity / self.dt).round() as usize;
        if n_grid < 2 {
            return Err(CalibrationError::invalid_settings(format!(
                "grid step {} is too coarse for a {max_maturity}-year curve",
                self.dt
            )));
        }
        let grid: Vec<f64> = (0..=n_grid)
            .map(|k| (k as f64 * self.dt).min(max_maturity))
            .collect();
        let mut p0t = spline.evaluate_grid(&grid)?;
        p0t[0] = 1.0;

        if let Some((index, price)) = p0t.iter().enumerate().find(|(_, p)| !(**p > 0.0)) {
            return Err(CalibrationError::numerical_instability(format!(
                "interpolated discount factor {price} at grid point {index} is not positive"
            )));
        }

        let f0t_raw = forward_rates(&p0t, self.dt);
        let f0t = smooth_forwards(&f0t_raw, self.dt, self.smoothing);

        tracing::debug!(
            pillars = benchmark.len(),
            grid_points = p0t.len(),
            dt = self.dt,
            "bootstrapped initial curve"
        );

        Ok(CalibratedCurve {
            dt: self.dt,
            p0t,
            f0t,
            f0t_raw,
            spline,
            reference_date: benchmark.reference_date(),
        })
    }
}

/// `-d ln P / dt`: forward difference first, centred inside, backward last.
fn forward_rates(p0t: &[f64], dt: f64) -> Vec<f64> {
    let log_p: Vec<f64> = p0t.iter().map(|p| p.ln()).collect();
    let n = log_p.len();
    (0..n)
        .map(|i| {
            if i == 0 {
                -(log_p[1] - log_p[0]) / dt
            } else if i + 1 == n {
                -(log_p[i] - log_p[i - 1]) / dt
            } else {
                -(log_p[i + 1] - log_p[i - 1]) / (2.0 * dt)
            }
        })
        .collect()
}

fn smooth_forwards(raw: &[f64], dt: f64, smoothing: CurveSmoothing) -> Vec<f64> {
    let mut smoothed = raw.to_vec();
    let n = raw.len();
    let start = (smoothing.start / dt).round() as usize;
    let window = (smoothing.window / dt).round() as usize;
    if window == 0 || start + window >= n {
        return smoothed;
    }
    let last = n - window;
    // Prefix sums make each window mean O(1)
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for &f in raw {
        let acc = prefix.last().copied().unwrap_or(0.0) + f;
        prefix.push(acc);
    }
    for i in start..last {
        smoothed[i] = (prefix[i + window + 1] - prefix[i]) / (window + 1) as f64;
    }
    let hold = smoothed[last - 1];
    for f in &mut smoothed[last..] {
        *f = hold;
    }
    smoothed
}

/// Initial curve on the calibration grid.
#[derive(Debug, Clone)]
pub struct CalibratedCurve {
    dt: f64,
    p0t: Vec<f64>,
    f0t: Vec<f64>,
    f0t_raw: Vec<f64>,
    spline: CubicSplineInterpolator<f64>,
    reference_date: Option<NaiveDate>,
}

impl CalibratedCurve {
    /// Grid step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of grid points, `t = 0` included.
    pub fn len(&self) -> usize {
        self.p0t.len()
    }

    /// Always false for a calibrated curve.
    pub fn is_empty(&self) -> bool {
        self.p0t.is_empty()
    }

    /// Last grid time.
    pub fn horizon(&self) -> f64 {
        (self.p0t.len() - 1) as f64 * self.dt
    }

    /// Whether the grid reaches `horizon` years.
    pub fn covers(&self, horizon: f64) -> bool {
        horizon <= self.horizon() + 1e-9 * self.dt
    }

    /// Discount factors on the grid, `p0t()[0] == 1`.
    pub fn p0t(&self) -> &[f64] {
        &self.p0t
    }

    /// Smoothed forwards on the grid.
    pub fn f0t(&self) -> &[f64] {
        &self.f0t
    }

    /// Forwards before smoothing.
    pub fn f0t_raw(&self) -> &[f64] {
        &self.f0t_raw
    }

    /// Benchmark reference date, if any.
    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.reference_date
    }

    /// Discount factor at any `t` within the curve, from the price spline.
    pub fn discount(&self, t: f64) -> Result<f64, InterpolationError> {
        if t == 0.0 {
            return Ok(1.0);
        }
        self.spline.interpolate(t)
    }

    /// Smoothed instantaneous forward at `t`, linear between grid points.
    pub fn forward(&self, t: f64) -> Result<f64, InterpolationError> {
        let horizon = self.horizon();
        if !(t >= 0.0 && t <= horizon * (1.0 + f64::EPSILON)) {
            return Err(InterpolationError::OutOfBounds {
                x: t,
                min: 0.0,
                max: horizon,
            });
        }
        let position = t / self.dt;
        let i = (position.floor() as usize).min(self.f0t.len() - 2);
        let w = (position - i as f64).clamp(0.0, 1.0);
        Ok(self.f0t[i] + w * (self.f0t[i + 1] - self.f0t[i]))
    }

    /// Continuously compounded zero rate `-ln P(0,t) / t`; the short forward at `t = 0`.
    pub fn zero_rate(&self, t: f64) -> Result<f64, InterpolationError> {
        if t == 0.0 {
            return Ok(self.f0t[0]);
        }
        Ok(-self.discount(t)?.ln() / t)
    }
}

impl InitialCurve for CalibratedCurve {
    fn discount(&self, t: f64) -> Result<f64, InterpolationError> {
        CalibratedCurve::discount(self, t)
    }

    fn forward(&self, t: f64) -> Result<f64, InterpolationError> {
        CalibratedCurve::forward(self, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_flat_curve_forwards() {
        let benchmark = BenchmarkCurve::flat(0.02, 30).unwrap();
        let curve = CurveCalibrator::new(0.01).unwrap().calibrate(&benchmark).unwrap();
        assert_eq!(curve.len(), 3001);
        assert_relative_eq!(curve.horizon(), 30.0, epsilon = 1e-9);
        assert_eq!(curve.p0t()[0], 1.0);
        // Annual 2% is 1.98% continuously compounded
        let cc = 1.02_f64.ln();
        for &f in &curve.f0t()[100..2900] {
            assert!((f - cc).abs() < 2e-4, "forward {f} far from {cc}");
        }
        assert_relative_eq!(curve.zero_rate(10.0).unwrap(), cc, epsilon = 1e-10);
        assert_relative_eq!(curve.p0t()[1000], 1.02_f64.powi(-10), epsilon = 1e-12);
    }

    #[test]
    fn test_too_few_points() {
        let benchmark = BenchmarkCurve::new(vec![(1, 0.01), (2, 0.012), (3, 0.014)]).unwrap();
        let err = CurveCalibrator::new(0.5).unwrap().calibrate(&benchmark).unwrap_err();
        assert_eq!(err, CalibrationError::insufficient_data(4, 3));
    }

    #[test]
    fn test_invalid_step() {
        assert!(CurveCalibrator::new(0.0).is_err());
        assert!(CurveCalibrator::new(f64::NAN).is_err());
    }

    #[test]
    fn test_smoothing_window_average() {
        let raw: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let smoothed = smooth_forwards(
            &raw,
            1.0,
            CurveSmoothing {
                start: 2.0,
                window: 3.0,
            },
        );
        // Indices 2..7 average four points, 7.. hold the value at 6
        assert_eq!(&smoothed[..2], &[0.0, 1.0]);
        assert_relative_eq!(smoothed[2], 3.5);
        assert_relative_eq!(smoothed[6], 7.5);
        assert_relative_eq!(smoothed[7], 7.5);
        assert_relative_eq!(smoothed[9], 7.5);
    }

    #[test]
    fn test_smoothing_beyond_curve_is_noop() {
        let raw = vec![0.01, 0.02, 0.03];
        assert_eq!(smooth_forwards(&raw, 1.0, CurveSmoothing::default()), raw);
    }

    #[test]
    fn test_long_curve_smoothing_changes_only_the_tail() {
        let pillars: Vec<(u32, f64)> = (1..=100)
            .map(|m| (m, 0.01 + 0.02 * (f64::from(m) / 10.0).sin().abs()))
            .collect();
        let benchmark = BenchmarkCurve::new(pillars).unwrap();
        let curve = CurveCalibrator::new(0.25).unwrap().calibrate(&benchmark).unwrap();
        let start = (60.0 / 0.25) as usize;
        assert_eq!(&curve.f0t()[..start], &curve.f0t_raw()[..start]);
        assert_ne!(&curve.f0t()[start..], &curve.f0t_raw()[start..]);
        let tail = &curve.f0t()[curve.len() - 80..];
        assert!(tail.iter().all(|&f| f == tail[0]));
    }

    #[test]
    fn test_forward_interpolation_and_bounds() {
        let benchmark = BenchmarkCurve::flat(0.03, 10).unwrap();
        let curve = CurveCalibrator::new(0.5).unwrap().calibrate(&benchmark).unwrap();
        let f = curve.forward(2.25).unwrap();
        assert_relative_eq!(f, 0.5 * (curve.f0t()[4] + curve.f0t()[5]), epsilon = 1e-15);
        assert!(curve.forward(10.5).is_err());
        assert!(curve.discount(10.5).is_err());
        assert!(curve.covers(10.0));
        assert!(!curve.covers(10.5));
    }

    #[test]
    fn test_reference_date_is_carried() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let benchmark = BenchmarkCurve::flat(0.02, 5).unwrap().with_reference_date(date);
        let curve = CurveCalibrator::new(0.1).unwrap().calibrate(&benchmark).unwrap();
        assert_eq!(curve.reference_date(), Some(date));
    }

    proptest! {
        #[test]
        fn test_upward_curves_give_decreasing_prices(
            base in 0.0_f64..0.05,
            slope in 0.0_f64..0.002,
        ) {
            let pillars: Vec<(u32, f64)> =
                (1..=20).map(|m| (m, base + slope * f64::from(m))).collect();
            let benchmark = BenchmarkCurve::new(pillars).unwrap();
            let curve = CurveCalibrator::new(0.1).unwrap().calibrate(&benchmark).unwrap();
            prop_assert_eq!(curve.p0t()[0], 1.0);
            for w in curve.p0t().windows(2) {
                prop_assert!(w[1] <= w[0] + 1e-9);
            }
        }
    }
}
