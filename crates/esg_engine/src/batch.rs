//! The exported scenario batch.

use serde::{Deserialize, Serialize};

use crate::assets::AssetReturns;
use crate::deflator::DeflatorTensor;
use crate::filter::FilterOutcome;
use crate::paths::PathMatrix;
use crate::shocks::ShockTensor;

/// Probability measure of a scenario set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// Risk-neutral
    RiskNeutral,
    /// Real-world, with the risk-premium overlay
    RealWorld,
}

/// Asset class of a return series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    /// Rolled-over short-rate deposit
    Cash,
    /// Equity index
    Equity,
    /// Real-estate index
    RealEstate,
}

impl AssetClass {
    /// Every asset class.
    pub const ALL: [AssetClass; 3] = [AssetClass::Cash, AssetClass::Equity, AssetClass::RealEstate];
}

/// Component of a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnKind {
    /// Price plus income
    Total,
    /// Capital return
    Price,
    /// Dividend, rental or interest income
    Income,
}

/// Reporting-step scenarios of one measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSet {
    /// Short rate at each reporting point
    pub short_rate: PathMatrix,
    /// Cash returns over each reporting interval
    pub cash: AssetReturns,
    /// Equity returns over each reporting interval
    pub equity: AssetReturns,
    /// Real-estate returns over each reporting interval
    pub real_estate: AssetReturns,
}

impl ScenarioSet {
    /// Returns of one asset class.
    pub fn asset(&self, class: AssetClass) -> &AssetReturns {
        match class {
            AssetClass::Cash => &self.cash,
            AssetClass::Equity => &self.equity,
            AssetClass::RealEstate => &self.real_estate,
        }
    }

    /// One return series.
    pub fn returns(&self, class: AssetClass, kind: ReturnKind) -> &PathMatrix {
        let asset = self.asset(class);
        match kind {
            ReturnKind::Total => &asset.total,
            ReturnKind::Price => &asset.price,
            ReturnKind::Income => &asset.income,
        }
    }
}

/// Scenarios handed to downstream consumers.
///
/// Return and deflator matrices are `N × (n_report + 1)` with reporting point
/// 0 at `t = 0`; returns are log-returns over the interval ending at their
/// point (zero at point 0). The shock tensor stays on the fine grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioBatch {
    /// Reporting times in years, starting at 0
    pub report_times: Vec<f64>,
    /// Risk-neutral scenarios
    pub risk_neutral: ScenarioSet,
    /// Real-world scenarios
    pub real_world: ScenarioSet,
    /// Discount factors in both measures
    pub deflators: DeflatorTensor,
    /// Correlated fine-grid shocks in canonical factor order
    pub shocks: ShockTensor,
    /// What the path filter did
    pub filter: FilterOutcome,
    /// The filter was abandoned and the batch may hold exploding paths
    pub path_explosion: bool,
}

impl ScenarioBatch {
    /// Number of scenarios.
    pub fn n_scenarios(&self) -> usize {
        self.deflators.n_scenarios()
    }

    /// Number of reporting points, `t = 0` included.
    pub fn n_report_points(&self) -> usize {
        self.report_times.len()
    }

    /// Scenarios of one measure.
    pub fn measure(&self, measure: Measure) -> &ScenarioSet {
        match measure {
            Measure::RiskNeutral => &self.risk_neutral,
            Measure::RealWorld => &self.real_world,
        }
    }

    /// Deflators of one measure.
    pub fn deflators(&self, measure: Measure) -> &PathMatrix {
        match measure {
            Measure::RiskNeutral => &self.deflators.risk_neutral,
            Measure::RealWorld => &self.deflators.real_world,
        }
    }

    /// One return series of one measure.
    pub fn returns(&self, measure: Measure, class: AssetClass, kind: ReturnKind) -> &PathMatrix {
        self.measure(measure).returns(class, kind)
    }
}
