//! Stochastic models of the scenario generator.
//!
//! - [`rates`]: Hull-White one-factor closed forms, swaption pricing and the
//!   risk-premium process used for the real-world overlay
//! - [`hybrid`]: risk factors and their correlation structure
//! - [`equity`]: Black-Scholes style equity returns
//! - [`real_estate`]: real-estate returns driven by an auxiliary rate
//!
//! Models expose parameters and exact one-step moments only. Path storage
//! and random draws belong to the Monte Carlo engine.

pub mod equity;
pub mod error;
pub mod hybrid;
pub mod rates;
pub mod real_estate;

pub use error::ModelError;
