//! # esg_engine (L3: Scenario Engine)
//!
//! Monte Carlo engine of the economic scenario generator.
//!
//! This crate provides:
//! - Generation configuration with TOML loading and `ESG_*` overrides in [`config`]
//! - A single seeded random stream with antithetic fills in [`rng`]
//! - Hull-White short-rate paths in both measures in [`simulator`]
//! - Rejection and regeneration of exploding paths in [`filter`]
//! - Shocks correlated with the simulated rates in [`shocks`]
//! - Cash, equity and real-estate returns in [`assets`] and deflators in [`deflator`]
//! - The exported [`batch::ScenarioBatch`] and [`diagnostics::RunDiagnostics`]
//! - The [`generator::ScenarioGenerator`] running the whole pipeline
//!
//! ## Usage
//!
//! ```rust,no_run
//! use esg_core::market_data::BenchmarkCurve;
//! use esg_engine::{GenerationConfig, ScenarioGenerator};
//! use esg_models::models::rates::HullWhiteParams;
//!
//! let config = GenerationConfig::default()
//!     .with_scenarios(1000)
//!     .with_time_grid(10.0, 0.01, 1.0)
//!     .with_hull_white(HullWhiteParams::new(0.05, 0.01).unwrap());
//! let generator = ScenarioGenerator::new(config).unwrap();
//! let benchmark = BenchmarkCurve::flat(0.02, 30).unwrap();
//! let output = generator.generate(&benchmark, &[]).unwrap();
//! println!("{:?}", output.diagnostics.martingale_error);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod assets;
pub mod batch;
pub mod config;
pub mod deflator;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod generator;
pub mod paths;
pub mod rng;
pub mod shocks;
pub mod simulator;

pub use batch::{AssetClass, Measure, ReturnKind, ScenarioBatch, ScenarioSet};
pub use config::{GenerationConfig, TimeGrid};
pub use deflator::{DeflatorBuilder, DeflatorTensor};
pub use diagnostics::{QuantileBand, RunDiagnostics};
pub use error::{ConfigError, EngineError};
pub use filter::{FilterOutcome, PathFilter};
pub use generator::{GenerationOutput, ScenarioGenerator};
pub use paths::PathMatrix;
pub use rng::ScenarioRng;
pub use shocks::{CorrelationEngine, ShockTensor};
pub use simulator::{CurveGrid, HullWhiteSimulator, RateScenarios};
