//! # esg_models (L2: Models and Calibration)
//!
//! Stochastic models and their calibration for the scenario generator.
//!
//! This crate provides:
//! - Analytical formulas (normal distribution, Bachelier) in [`analytical`]
//! - Hull-White one-factor closed forms, the risk-premium OU process,
//!   correlation structure, equity and real-estate models in [`models`]
//! - Curve bootstrapping and swaption calibration in [`calibration`]
//!
//! ## Design Principles
//!
//! - **Immutable calibration outputs**: curves and parameters are plain
//!   values passed into each consumer, never global state
//! - **Closed forms first**: every model exposes the exact one-step moments
//!   used by the Monte Carlo engine so the discretisation carries no bias
//! - **Builder pattern** for configuration with sensible defaults

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analytical;
pub mod calibration;
pub mod models;
