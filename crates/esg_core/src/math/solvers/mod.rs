//! Root-finding solvers.
//!
//! - [`BrentSolver`]: bracketing method without derivative requirement, used for
//!   Bachelier implied volatilities and the Jamshidian optimal exercise rate
//!
//! Solvers are configured with [`SolverConfig`]:
//! - `tolerance`: Convergence tolerance (default: 1e-10)
//! - `max_iterations`: Maximum iteration count (default: 100)
//! - `max_expansions`: Bracket doublings allowed when searching for a sign change (default: 50)
//!
//! ```
//! use esg_core::math::solvers::{BrentSolver, SolverConfig};
//!
//! let solver = BrentSolver::new(SolverConfig::default());
//! let root = solver.find_root(|x: f64| x * x - 2.0, 0.0, 2.0).unwrap();
//! assert!((root - std::f64::consts::SQRT_2).abs() < 1e-10);
//! ```

mod brent;
mod config;

pub use brent::BrentSolver;
pub use config::SolverConfig;
