//! Mathematical building blocks.
//!
//! - [`interpolators`]: natural cubic spline used to refine the benchmark curve
//! - [`solvers`]: Brent root finder for implied volatilities and exercise rates
//! - [`statistics`]: cross-sectional moments and quantiles over scenarios

pub mod interpolators;
pub mod solvers;
pub mod statistics;
