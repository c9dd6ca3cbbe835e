//! Numeric traits shared across the workspace.
//!
//! All generic numerical kernels are written against `num_traits::Float`,
//! re-exported here so downstream crates do not need a direct dependency.

pub use num_traits::Float;
