//! Named risk factors and calibrated correlation presets.
//!
//! The correlation matrix is factorised in the *Cholesky order*
//! (short rate first, so its row of `L` is the unit vector and the short-rate
//! shock can be supplied by the rate simulator). Results are handed out in the
//! *canonical order* used by downstream consumers. The two orders differ:
//!
//! | slot | Cholesky order | canonical order |
//! |------|----------------|-----------------|
//! | 0    | short rate     | inflation       |
//! | 1    | inflation      | real estate     |
//! | 2    | real estate    | long rate       |
//! | 3    | long rate      | short rate      |
//! | 4    | equity         | equity          |

use serde::{Deserialize, Serialize};

use super::correlated::{CholeskyFactor, CorrelationError, CorrelationMatrix};

/// Number of modelled risk factors.
pub const N_FACTORS: usize = 5;

/// Risk factor driving one shock series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    /// Inflation
    Inflation,
    /// Real-estate excess return
    RealEstate,
    /// Long real rate
    LongRate,
    /// Short real rate
    ShortRate,
    /// Equity excess return
    Equity,
}

impl RiskFactor {
    /// Order in which the correlation matrix is factorised.
    pub const CHOLESKY_ORDER: [RiskFactor; N_FACTORS] = [
        RiskFactor::ShortRate,
        RiskFactor::Inflation,
        RiskFactor::RealEstate,
        RiskFactor::LongRate,
        RiskFactor::Equity,
    ];

    /// Order in which shocks are exported.
    pub const CANONICAL_ORDER: [RiskFactor; N_FACTORS] = [
        RiskFactor::Inflation,
        RiskFactor::RealEstate,
        RiskFactor::LongRate,
        RiskFactor::ShortRate,
        RiskFactor::Equity,
    ];

    /// Factor whose shocks are the residuals of the simulated short rate.
    pub const ANCHOR: RiskFactor = RiskFactor::ShortRate;

    /// Position in [`RiskFactor::CHOLESKY_ORDER`].
    pub fn cholesky_index(self) -> usize {
        match self {
            RiskFactor::ShortRate => 0,
            RiskFactor::Inflation => 1,
            RiskFactor::RealEstate => 2,
            RiskFactor::LongRate => 3,
            RiskFactor::Equity => 4,
        }
    }

    /// Position in [`RiskFactor::CANONICAL_ORDER`].
    pub fn canonical_index(self) -> usize {
        match self {
            RiskFactor::Inflation => 0,
            RiskFactor::RealEstate => 1,
            RiskFactor::LongRate => 2,
            RiskFactor::ShortRate => 3,
            RiskFactor::Equity => 4,
        }
    }

    /// Snake-case name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            RiskFactor::Inflation => "inflation",
            RiskFactor::RealEstate => "real_estate",
            RiskFactor::LongRate => "long_rate",
            RiskFactor::ShortRate => "short_rate",
            RiskFactor::Equity => "equity",
        }
    }
}

impl std::fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Target correlation between the five risk factors, rows in Cholesky order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorCorrelation {
    rows: [[f64; N_FACTORS]; N_FACTORS],
}

impl FactorCorrelation {
    /// Matrix with rows and columns in [`RiskFactor::CHOLESKY_ORDER`].
    pub fn from_cholesky_rows(rows: [[f64; N_FACTORS]; N_FACTORS]) -> Self {
        Self { rows }
    }

    /// Matrix with rows and columns in [`RiskFactor::CANONICAL_ORDER`].
    pub fn from_canonical_rows(canonical: [[f64; N_FACTORS]; N_FACTORS]) -> Self {
        let mut rows = [[0.0; N_FACTORS]; N_FACTORS];
        for a in RiskFactor::CHOLESKY_ORDER {
            for b in RiskFactor::CHOLESKY_ORDER {
                rows[a.cholesky_index()][b.cholesky_index()] =
                    canonical[a.canonical_index()][b.canonical_index()];
            }
        }
        Self { rows }
    }

    /// Ahlgrim, D'Arcy and Gorvett (2005) calibration.
    #[rustfmt::skip]
    pub fn ahlgrim_2005() -> Self {
        Self::from_cholesky_rows([
            // short  infl   RE    long  equity
            [1.00, 0.25, 0.35, 0.80, 0.15],
            [0.25, 1.00, 0.45, 0.30, 0.10],
            [0.35, 0.45, 1.00, 0.40, 0.50],
            [0.80, 0.30, 0.40, 1.00, 0.20],
            [0.15, 0.10, 0.50, 0.20, 1.00],
        ])
    }

    /// Weaker dependence across asset classes.
    #[rustfmt::skip]
    pub fn conservative() -> Self {
        Self::from_cholesky_rows([
            [1.00, 0.15, 0.20, 0.70, 0.10],
            [0.15, 1.00, 0.30, 0.20, 0.05],
            [0.20, 0.30, 1.00, 0.25, 0.35],
            [0.70, 0.20, 0.25, 1.00, 0.15],
            [0.10, 0.05, 0.35, 0.15, 1.00],
        ])
    }

    /// Stressed dependence, correlations rising in a crisis.
    #[rustfmt::skip]
    pub fn stress() -> Self {
        Self::from_cholesky_rows([
            [1.00, 0.40, 0.50, 0.90, 0.25],
            [0.40, 1.00, 0.60, 0.45, 0.20],
            [0.50, 0.60, 1.00, 0.55, 0.65],
            [0.90, 0.45, 0.55, 1.00, 0.30],
            [0.25, 0.20, 0.65, 0.30, 1.00],
        ])
    }

    /// Target correlation between two factors.
    pub fn get(&self, a: RiskFactor, b: RiskFactor) -> f64 {
        self.rows[a.cholesky_index()][b.cholesky_index()]
    }

    /// Rows in Cholesky order.
    pub fn cholesky_rows(&self) -> &[[f64; N_FACTORS]; N_FACTORS] {
        &self.rows
    }

    /// Validated matrix in Cholesky order.
    pub fn matrix(&self) -> Result<CorrelationMatrix<f64>, CorrelationError> {
        let data: Vec<f64> = self.rows.iter().flatten().copied().collect();
        CorrelationMatrix::new(&data, N_FACTORS)
    }

    /// Cholesky factor in Cholesky order.
    pub fn cholesky(&self) -> Result<CholeskyFactor<f64>, CorrelationError> {
        self.matrix()?.cholesky()
    }
}

impl Default for FactorCorrelation {
    fn default() -> Self {
        Self::ahlgrim_2005()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_orders_are_consistent() {
        for (i, f) in RiskFactor::CHOLESKY_ORDER.iter().enumerate() {
            assert_eq!(f.cholesky_index(), i);
        }
        for (i, f) in RiskFactor::CANONICAL_ORDER.iter().enumerate() {
            assert_eq!(f.canonical_index(), i);
        }
        assert_eq!(RiskFactor::ANCHOR.cholesky_index(), 0);
        assert_ne!(RiskFactor::CHOLESKY_ORDER, RiskFactor::CANONICAL_ORDER);
    }

    #[test]
    fn test_presets_factorise() {
        for preset in [
            FactorCorrelation::ahlgrim_2005(),
            FactorCorrelation::conservative(),
            FactorCorrelation::stress(),
        ] {
            let chol = preset.cholesky().unwrap();
            // Anchor row is the unit vector
            assert_relative_eq!(chol.get(0, 0), 1.0);
            for (a, b) in chol.reconstruct().iter().zip(preset.cholesky_rows().iter().flatten()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_lookup_by_factor() {
        let corr = FactorCorrelation::ahlgrim_2005();
        assert_eq!(corr.get(RiskFactor::ShortRate, RiskFactor::LongRate), 0.80);
        assert_eq!(corr.get(RiskFactor::Equity, RiskFactor::RealEstate), 0.50);
        assert_eq!(corr.get(RiskFactor::Inflation, RiskFactor::Inflation), 1.0);
    }

    #[test]
    fn test_canonical_rows_round_trip() {
        let corr = FactorCorrelation::stress();
        let mut canonical = [[0.0; N_FACTORS]; N_FACTORS];
        for a in RiskFactor::CANONICAL_ORDER {
            for b in RiskFactor::CANONICAL_ORDER {
                canonical[a.canonical_index()][b.canonical_index()] = corr.get(a, b);
            }
        }
        assert_eq!(FactorCorrelation::from_canonical_rows(canonical), corr);
    }

    #[test]
    fn test_invalid_matrix_is_reported() {
        let mut rows = *FactorCorrelation::ahlgrim_2005().cholesky_rows();
        rows[0][3] = 1.5;
        rows[3][0] = 1.5;
        assert!(FactorCorrelation::from_cholesky_rows(rows).cholesky().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(RiskFactor::RealEstate.to_string(), "real_estate");
    }
}
