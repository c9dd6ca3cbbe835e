//! Brent's method root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;
use num_traits::Float;

/// Brent's method root finder.
///
/// Combines bisection, secant, and inverse quadratic interpolation. Requires
/// a bracket `[a, b]` with a sign change and no derivatives.
///
/// # Example
///
/// ```
/// use esg_core::math::solvers::{BrentSolver, SolverConfig};
///
/// let solver = BrentSolver::new(SolverConfig::default());
///
/// // Solve x³ - x - 2 = 0 in bracket [1, 2]
/// let f = |x: f64| x * x * x - x - 2.0;
/// let root = solver.find_root(f, 1.0, 2.0).unwrap();
/// assert!(f(root).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct BrentSolver<T: Float> {
    config: SolverConfig<T>,
}

impl<T: Float> BrentSolver<T> {
    /// Create a new Brent solver with the given configuration.
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: SolverConfig::default(),
        }
    }

    /// Returns a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }

    /// Find a root of `f` in the bracket `[a, b]`.
    ///
    /// # Errors
    ///
    /// * `SolverError::NoBracket` - `f(a)` and `f(b)` have the same sign
    /// * `SolverError::NumericalInstability` - `f` returned a non-finite value
    /// * `SolverError::MaxIterationsExceeded` - Failed to converge
    pub fn find_root<F>(&self, f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        let mut a = a;
        let mut b = b;
        let mut fa = checked(&f, a)?;
        let mut fb = checked(&f, b)?;

        if fa == T::zero() {
            return Ok(a);
        }
        if fb == T::zero() {
            return Ok(b);
        }
        if fa.signum() == fb.signum() {
            return Err(SolverError::NoBracket {
                a: a.to_f64().unwrap_or(f64::NAN),
                b: b.to_f64().unwrap_or(f64::NAN),
            });
        }

        let two = T::from(2.0).unwrap();
        let three = T::from(3.0).unwrap();
        let half = T::from(0.5).unwrap();

        let mut c = b;
        let mut fc = fb;
        let mut d = b - a;
        let mut e = d;

        for _ in 0..self.config.max_iterations {
            // Keep the root bracketed by [b, c]
            if fb.signum() == fc.signum() {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol = two * T::epsilon() * b.abs() + half * self.config.tolerance;
            let m = half * (c - b);

            if m.abs() <= tol || fb.abs() < self.config.tolerance {
                return Ok(b);
            }

            if e.abs() >= tol && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (mut p, mut q) = if a == c {
                    // Secant step
                    (two * m * s, T::one() - s)
                } else {
                    // Inverse quadratic interpolation
                    let q = fa / fc;
                    let r = fb / fc;
                    (
                        s * (two * m * q * (q - r) - (b - a) * (r - T::one())),
                        (q - T::one()) * (r - T::one()) * (s - T::one()),
                    )
                };
                if p > T::zero() {
                    q = -q;
                }
                p = p.abs();

                let min1 = three * m * q - (tol * q).abs();
                let min2 = (e * q).abs();
                if two * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = m;
                    e = m;
                }
            } else {
                d = m;
                e = m;
            }

            a = b;
            fa = fb;
            b = if d.abs() > tol {
                b + d
            } else if m > T::zero() {
                b + tol
            } else {
                b - tol
            };
            fb = checked(&f, b)?;
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        })
    }

    /// Find a root of `f`, widening `[a, b]` until it brackets a sign change.
    ///
    /// The bracket width doubles on the side whose function value is closer
    /// to zero, at most `max_expansions` times.
    ///
    /// # Errors
    ///
    /// `SolverError::NoBracket` with the final bracket if no sign change was found.
    pub fn find_root_expanding<F>(&self, f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        let mut lo = a.min(b);
        let mut hi = a.max(b);
        let mut f_lo = checked(&f, lo)?;
        let mut f_hi = checked(&f, hi)?;

        let mut expansions = 0;
        while f_lo.signum() == f_hi.signum() && f_lo != T::zero() && f_hi != T::zero() {
            if expansions >= self.config.max_expansions {
                return Err(SolverError::NoBracket {
                    a: lo.to_f64().unwrap_or(f64::NAN),
                    b: hi.to_f64().unwrap_or(f64::NAN),
                });
            }
            let width = hi - lo;
            if f_lo.abs() < f_hi.abs() {
                lo = lo - width;
                f_lo = checked(&f, lo)?;
            } else {
                hi = hi + width;
                f_hi = checked(&f, hi)?;
            }
            expansions += 1;
        }

        self.find_root(f, lo, hi)
    }
}

fn checked<T: Float, F: Fn(T) -> T>(f: &F, x: T) -> Result<T, SolverError> {
    let value = f(x);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SolverError::NumericalInstability(format!(
            "non-finite function value at x = {}",
            x.to_f64().unwrap_or(f64::NAN)
        )))
    }
}
