//! # esg_core: Numerical Foundation for Scenario Generation
//!
//! ## Layer 1 (Foundation) Role
//!
//! esg_core is the bottom layer of the scenario generator workspace, providing:
//! - Natural cubic spline interpolation (`math::interpolators`)
//! - Bracketing root finder (`math::solvers`)
//! - Cross-sectional statistics for scenario diagnostics (`math::statistics`)
//! - Benchmark term-structure input (`market_data`)
//! - Error types: `InterpolationError`, `SolverError`, `MarketDataError` (`types::error`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other esg_* crates, with minimal external dependencies:
//! - num-traits: Traits for generic numerical computation
//! - chrono: Curve reference dates
//! - serde: Serialisation of market inputs
//! - thiserror: Error derivation
//!
//! ## Usage Examples
//!
//! ```rust
//! use esg_core::market_data::BenchmarkCurve;
//! use esg_core::math::interpolators::{CubicSplineInterpolator, Interpolator};
//!
//! let curve = BenchmarkCurve::flat(0.02, 30).unwrap();
//! assert_eq!(curve.len(), 30);
//!
//! let spline = CubicSplineInterpolator::new(&[0.0, 1.0, 2.0, 3.0], &[1.0, 0.98, 0.96, 0.94]).unwrap();
//! let y = spline.interpolate(1.5_f64).unwrap();
//! assert!((y - 0.97).abs() < 1e-3);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod traits;
pub mod types;
