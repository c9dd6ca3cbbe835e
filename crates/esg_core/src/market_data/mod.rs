//! Market data inputs.
//!
//! - [`BenchmarkCurve`]: the benchmark term structure the engine calibrates to
//! - [`MarketDataError`]: validation failures for market inputs

mod benchmark;
mod error;

pub use benchmark::{nelson_siegel, BenchmarkCurve, CurvePoint};
pub use error::MarketDataError;
