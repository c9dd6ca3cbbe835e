//! Discount factors along each scenario.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::paths::PathMatrix;
use crate::simulator::RateScenarios;

/// Per-scenario discount factors at the reporting points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeflatorTensor {
    /// `exp(-Σ Rt)` along the risk-neutral path
    pub risk_neutral: PathMatrix,
    /// `exp(-Σ Rt)` along the real-world path
    pub real_world: PathMatrix,
}

impl DeflatorTensor {
    /// Number of scenarios.
    pub fn n_scenarios(&self) -> usize {
        self.risk_neutral.n_paths()
    }

    /// Cross-scenario mean of the risk-neutral deflators at every reporting point.
    pub fn mean_risk_neutral(&self) -> Vec<f64> {
        self.risk_neutral.column_means()
    }
}

/// Builds deflators from integrated rates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeflatorBuilder {
    stride: usize,
}

impl DeflatorBuilder {
    /// Builder reporting every `stride` fine points.
    pub fn new(stride: usize) -> Self {
        Self {
            stride: stride.max(1),
        }
    }

    /// Fine-grid deflators `exp(-cumulative Rt)`.
    pub fn fine(&self, integrated_rate: &PathMatrix) -> PathMatrix {
        integrated_rate.cumulative().map(|x| (-x).exp())
    }

    /// Deflators subset to the reporting grid.
    ///
    /// Discount factors are already cumulative, so no re-aggregation is needed.
    pub fn build(&self, integrated_rate: &PathMatrix) -> PathMatrix {
        self.fine(integrated_rate).downsample_stock(self.stride)
    }

    /// Both measures.
    ///
    /// # Errors
    /// `DimensionMismatch` when the two measures disagree in shape.
    pub fn build_tensor(&self, paths: &RateScenarios) -> Result<DeflatorTensor, EngineError> {
        EngineError::check_dimension(
            "real-world scenarios",
            paths.integrated_rate.n_paths(),
            paths.integrated_rate_rw.n_paths(),
        )?;
        EngineError::check_dimension(
            "real-world points",
            paths.integrated_rate.n_points(),
            paths.integrated_rate_rw.n_points(),
        )?;
        Ok(DeflatorTensor {
            risk_neutral: self.build(&paths.integrated_rate),
            real_world: self.build(&paths.integrated_rate_rw),
        })
    }
}
