//! Interpolation methods for numerical computation.
//!
//! ## Available Interpolators
//!
//! - [`CubicSplineInterpolator`]: Natural cubic spline with C² continuity
//!
//! ## Core Trait
//!
//! All 1D interpolators implement the [`Interpolator`] trait, which defines:
//! - `interpolate(x: T) -> Result<T, InterpolationError>`: Compute interpolated value
//! - `domain() -> (T, T)`: Return valid interpolation range
//!
//! ## Example
//!
//! ```
//! use esg_core::math::interpolators::{CubicSplineInterpolator, Interpolator};
//!
//! let xs = [0.0, 1.0, 2.0, 3.0];
//! let ys = [0.0, 1.0, 4.0, 9.0];
//!
//! let interp = CubicSplineInterpolator::new(&xs, &ys).unwrap();
//! let (x_min, x_max) = interp.domain();
//! assert_eq!(x_min, 0.0);
//! assert_eq!(x_max, 3.0);
//! ```

mod cubic_spline;

pub use cubic_spline::CubicSplineInterpolator;

use crate::types::InterpolationError;
use num_traits::Float;

/// One-dimensional interpolator over a bounded domain.
pub trait Interpolator<T: Float> {
    /// Interpolate the value at `x`.
    ///
    /// # Errors
    ///
    /// Returns `InterpolationError::OutOfBounds` if `x` lies outside [`Interpolator::domain`].
    fn interpolate(&self, x: T) -> Result<T, InterpolationError>;

    /// Return the valid interpolation domain `(x_min, x_max)`.
    fn domain(&self) -> (T, T);
}
