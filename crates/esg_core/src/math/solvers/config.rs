//! Solver configuration types.

use num_traits::Float;

/// Configuration for root-finding algorithms.
///
/// # Example
///
/// ```
/// use esg_core::math::solvers::SolverConfig;
///
/// let config: SolverConfig<f64> = SolverConfig::default();
/// assert!(config.tolerance < 1e-8);
///
/// let custom = SolverConfig::new(1e-12, 200);
/// assert_eq!(custom.max_iterations, 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig<T: Float> {
    /// Convergence tolerance on both `|f(x)|` and the bracket half-width.
    pub tolerance: T,

    /// Maximum number of iterations before giving up.
    pub max_iterations: usize,

    /// Maximum number of bracket doublings for [`super::BrentSolver::find_root_expanding`].
    pub max_expansions: usize,
}

impl<T: Float> Default for SolverConfig<T> {
    /// Defaults: `tolerance = 1e-10`, `max_iterations = 100`, `max_expansions = 50`.
    fn default() -> Self {
        Self {
            tolerance: T::from(1e-10).unwrap(),
            max_iterations: 100,
            max_expansions: 50,
        }
    }
}

impl<T: Float> SolverConfig<T> {
    /// Create a configuration with the given tolerance and iteration limit.
    ///
    /// Non-positive tolerances and zero iteration counts fall back to the defaults.
    pub fn new(tolerance: T, max_iterations: usize) -> Self {
        let default = Self::default();
        Self {
            tolerance: if tolerance > T::zero() {
                tolerance
            } else {
                default.tolerance
            },
            max_iterations: if max_iterations > 0 {
                max_iterations
            } else {
                default.max_iterations
            },
            max_expansions: default.max_expansions,
        }
    }
}
