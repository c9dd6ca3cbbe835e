//! Core error types.
//!
//! # Re-exports
//!
//! [`InterpolationError`] and [`SolverError`] from `error`.

pub mod error;

pub use error::{InterpolationError, SolverError};
