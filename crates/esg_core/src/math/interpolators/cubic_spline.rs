//! Natural cubic spline interpolation.

use super::Interpolator;
use crate::types::InterpolationError;
use num_traits::Float;

/// Polynomial coefficients for a cubic spline segment.
///
/// Represents a cubic polynomial: `y = a + b*(x-xi) + c*(x-xi)² + d*(x-xi)³`
#[derive(Debug, Clone, Copy)]
struct SplineCoeffs<T: Float> {
    a: T,
    b: T,
    c: T,
    d: T,
}

/// Natural cubic spline interpolator with C² continuity.
///
/// Stores strictly increasing knots and the natural cubic spline
/// coefficients (zero second derivative at both boundaries).
///
/// # Type Parameters
///
/// * `T` - Floating-point type (e.g., `f64`)
///
/// # Example
///
/// ```
/// use esg_core::math::interpolators::{Interpolator, CubicSplineInterpolator};
///
/// let xs: [f64; 4] = [0.0, 1.0, 2.0, 3.0];
/// let ys = [1.0, 0.98, 0.96, 0.94];
///
/// let interp = CubicSplineInterpolator::new(&xs, &ys).unwrap();
/// let y = interp.interpolate(2.5).unwrap();
/// assert!((y - 0.95).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct CubicSplineInterpolator<T: Float> {
    /// Strictly increasing x-coordinates
    xs: Vec<T>,
    /// Polynomial coefficients for each segment
    coeffs: Vec<SplineCoeffs<T>>,
}

impl<T: Float> CubicSplineInterpolator<T> {
    /// Construct a natural cubic spline from x and y data points.
    ///
    /// # Arguments
    ///
    /// * `xs` - Strictly increasing x-coordinates
    /// * `ys` - Corresponding y-values
    ///
    /// # Returns
    ///
    /// * `Err(InterpolationError::InvalidInput)` - Mismatched array lengths or non-finite data
    /// * `Err(InterpolationError::InsufficientData)` - Fewer than 3 data points
    /// * `Err(InterpolationError::NonMonotonicData)` - Knots not strictly increasing
    ///
    /// # Example
    ///
    /// ```
    /// use esg_core::math::interpolators::CubicSplineInterpolator;
    ///
    /// let result = CubicSplineInterpolator::new(&[0.0, 1.0], &[0.0, 1.0]);
    /// assert!(result.is_err());
    /// ```
    pub fn new(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        if xs.len() != ys.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "xs and ys must have same length: got {} and {}",
                xs.len(),
                ys.len()
            )));
        }

        if xs.len() < 3 {
            return Err(InterpolationError::InsufficientData {
                got: xs.len(),
                need: 3,
            });
        }

        if let Some(i) = xs
            .iter()
            .chain(ys.iter())
            .position(|v| !v.is_finite())
        {
            return Err(InterpolationError::InvalidInput(format!(
                "non-finite value at position {}",
                i % xs.len()
            )));
        }

        for i in 1..xs.len() {
            if xs[i] <= xs[i - 1] {
                return Err(InterpolationError::NonMonotonicData { index: i });
            }
        }

        let coeffs = Self::compute_coefficients(xs, ys);

        Ok(Self {
            xs: xs.to_vec(),
            coeffs,
        })
    }

    /// Compute natural cubic spline coefficients using the Thomas algorithm.
    ///
    /// Solves the tridiagonal system for the interior second derivatives `M`
    /// (with `M[0] = M[n-1] = 0`), then derives the segment polynomials.
    fn compute_coefficients(xs: &[T], ys: &[T]) -> Vec<SplineCoeffs<T>> {
        let n = xs.len();
        let two = T::from(2.0).unwrap();
        let six = T::from(6.0).unwrap();

        let h: Vec<T> = (0..n - 1).map(|i| xs[i + 1] - xs[i]).collect();

        // Interior equation i (1..n-1):
        // h[i-1]*M[i-1] + 2*(h[i-1]+h[i])*M[i] + h[i]*M[i+1] = 6*(slope[i] - slope[i-1])
        let interior = n - 2;
        let mut c_prime: Vec<T> = vec![T::zero(); interior];
        let mut d_prime: Vec<T> = vec![T::zero(); interior];

        for k in 0..interior {
            let i = k + 1;
            let sub = h[i - 1];
            let diag = two * (h[i - 1] + h[i]);
            let sup = h[i];
            let rhs = six * ((ys[i + 1] - ys[i]) / h[i] - (ys[i] - ys[i - 1]) / h[i - 1]);

            if k == 0 {
                c_prime[k] = sup / diag;
                d_prime[k] = rhs / diag;
            } else {
                let denom = diag - sub * c_prime[k - 1];
                c_prime[k] = sup / denom;
                d_prime[k] = (rhs - sub * d_prime[k - 1]) / denom;
            }
        }

        let mut m: Vec<T> = vec![T::zero(); n];
        for k in (0..interior).rev() {
            let next = m[k + 2];
            m[k + 1] = d_prime[k] - c_prime[k] * next;
        }

        (0..n - 1)
            .map(|i| SplineCoeffs {
                a: ys[i],
                b: (ys[i + 1] - ys[i]) / h[i] - h[i] * (two * m[i] + m[i + 1]) / six,
                c: m[i] / two,
                d: (m[i + 1] - m[i]) / (six * h[i]),
            })
            .collect()
    }

    /// Find the segment index `i` such that `xs[i] <= x < xs[i+1]`,
    /// clamped to the valid range `[0, n-2]`.
    #[inline]
    fn find_segment(&self, x: T) -> usize {
        let pos = self.xs.partition_point(|&xi| xi <= x);
        if pos == 0 {
            0
        } else if pos >= self.xs.len() {
            self.xs.len() - 2
        } else {
            pos - 1
        }
    }

    /// Evaluate the spline on every point of `grid`.
    ///
    /// # Errors
    ///
    /// Fails on the first grid point outside the domain.
    pub fn evaluate_grid(&self, grid: &[T]) -> Result<Vec<T>, InterpolationError> {
        grid.iter().map(|&x| self.interpolate(x)).collect()
    }

    /// Returns a reference to the knots.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Returns the number of knots.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Returns true if the interpolator has no knots.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

impl<T: Float> Interpolator<T> for CubicSplineInterpolator<T> {
    fn interpolate(&self, x: T) -> Result<T, InterpolationError> {
        let (x_min, x_max) = self.domain();

        // Knot arithmetic on a dt grid can overshoot the last knot by an ulp
        let slack = (x_max - x_min) * T::epsilon() * T::from(16.0).unwrap();
        if x < x_min - slack || x > x_max + slack {
            return Err(InterpolationError::OutOfBounds {
                x: x.to_f64().unwrap_or(f64::NAN),
                min: x_min.to_f64().unwrap_or(f64::NAN),
                max: x_max.to_f64().unwrap_or(f64::NAN),
            });
        }

        let i = self.find_segment(x);
        let coeffs = &self.coeffs[i];

        let dx = x - self.xs[i];
        Ok(coeffs.a + dx * (coeffs.b + dx * (coeffs.c + dx * coeffs.d)))
    }

    #[inline]
    fn domain(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_new_with_minimum_points() {
        let interp = CubicSplineInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
        assert_eq!(interp.len(), 3);
    }

    #[test]
    fn test_new_insufficient_data() {
        match CubicSplineInterpolator::new(&[0.0, 1.0], &[0.0, 1.0]) {
            Err(InterpolationError::InsufficientData { got, need }) => {
                assert_eq!(got, 2);
                assert_eq!(need, 3);
            }
            other => panic!("Expected InsufficientData error, got {:?}", other),
        }
    }

    #[test]
    fn test_new_mismatched_lengths() {
        match CubicSplineInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0]) {
            Err(InterpolationError::InvalidInput(msg)) => assert!(msg.contains("same length")),
            other => panic!("Expected InvalidInput error, got {:?}", other),
        }
    }

    #[test]
    fn test_new_rejects_unsorted_knots() {
        let result = CubicSplineInterpolator::new(&[0.0, 2.0, 1.0, 3.0], &[0.0, 4.0, 1.0, 9.0]);
        assert!(matches!(
            result,
            Err(InterpolationError::NonMonotonicData { index: 2 })
        ));
    }

    #[test]
    fn test_passes_through_knots() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = [1.0, 0.97, 0.95, 0.91, 0.90, 0.86];
        let interp = CubicSplineInterpolator::new(&xs, &ys).unwrap();

        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(interp.interpolate(*x).unwrap(), *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_data_is_reproduced_exactly() {
        let xs = [0.0, 1.0, 2.5, 4.0];
        let ys = [1.0, 3.0, 6.0, 9.0];
        let interp = CubicSplineInterpolator::new(&xs, &ys).unwrap();

        assert_relative_eq!(interp.interpolate(0.5).unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(interp.interpolate(3.3).unwrap(), 7.6, epsilon = 1e-12);
    }

    #[test]
    fn test_natural_boundary_three_points() {
        // M[1] = 6*(-1 - 1)/(2*2) = -3
        let interp = CubicSplineInterpolator::new(&[0.0, 1.0, 2.0], &[0.0, 1.0, 0.0]).unwrap();
        // b0 = 1 - (0 + (-3))/6 = 1.5, d0 = -3/6 = -0.5
        // y(0.5) = 1.5*0.5 - 0.5*0.125 = 0.6875
        assert_relative_eq!(interp.interpolate(0.5).unwrap(), 0.6875, epsilon = 1e-12);
        assert_relative_eq!(interp.interpolate(1.5).unwrap(), 0.6875, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_bounds() {
        let interp = CubicSplineInterpolator::new(&[1.0, 2.0, 3.0], &[1.0, 4.0, 9.0]).unwrap();
        assert!(matches!(
            interp.interpolate(3.5),
            Err(InterpolationError::OutOfBounds { .. })
        ));
        assert!(interp.interpolate(0.5).is_err());
    }

    #[test]
    fn test_evaluate_grid() {
        let interp =
            CubicSplineInterpolator::new(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.0, 2.0, 3.0]).unwrap();
        let grid: Vec<f64> = (0..=30).map(|i| i as f64 * 0.1).collect();
        let values = interp.evaluate_grid(&grid).unwrap();
        assert_eq!(values.len(), 31);
        assert_relative_eq!(values[30], 3.0, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn prop_interpolation_stays_between_linear_bounds_for_linear_data(
            slope in -2.0..2.0_f64,
            intercept in -1.0..1.0_f64,
            x in 0.0..10.0_f64,
        ) {
            let xs: Vec<f64> = (0..=10).map(|i| i as f64).collect();
            let ys: Vec<f64> = xs.iter().map(|x| intercept + slope * x).collect();
            let interp = CubicSplineInterpolator::new(&xs, &ys).unwrap();
            let y = interp.interpolate(x).unwrap();
            prop_assert!((y - (intercept + slope * x)).abs() < 1e-9);
        }
    }
}
