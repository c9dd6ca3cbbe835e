//! Calibration of the initial curve, the Hull-White parameters and the
//! satellite asset models.
//!
//! - [`CurveCalibrator`]: benchmark annual rates to `P0t` and smoothed `f0t`
//! - [`SwaptionCalibrator`]: swaption normal volatilities to `(a, σ)`
//! - [`historical`]: real-estate, equity volatility and Sharpe ratio
//!   estimates from observed series
//!
//! The curve and swaption fits run once per generation; their outputs are
//! immutable values.

mod curve;
mod error;
pub mod historical;
mod result;
mod swaption;
mod swaption_calibrator;

pub use curve::{CalibratedCurve, CurveCalibrator, CurveSmoothing, MIN_CURVE_POINTS};
pub use error::CalibrationError;
pub use historical::{calibrate_real_estate, equity_volatility, sharpe_ratio, RealEstateEstimate};
pub use result::{CalibrationDiagnostics, CalibrationResult};
pub use swaption::{
    ResolvedSwaption, SwaptionCalibratorConfig, SwaptionPricing, SwaptionQuote,
};
pub use swaption_calibrator::SwaptionCalibrator;
