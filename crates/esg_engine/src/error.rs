//! Error types for the scenario engine.

use esg_models::calibration::CalibrationError;
use esg_models::models::hybrid::CorrelationError;
use esg_models::models::ModelError;
use thiserror::Error;

/// Configuration error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration text is not valid TOML for [`GenerationConfig`](crate::config::GenerationConfig).
    #[error("Parse error: {0}")]
    Parse(String),

    /// One or more settings are invalid.
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Scenario generation error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Invalid generation settings.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Curve or swaption calibration failed.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// Model parameters rejected during simulation.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Correlation matrix could not be factorised.
    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    /// Two components disagree on a dimension.
    #[error("Dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Quantity being checked
        what: &'static str,
        /// Expected size
        expected: usize,
        /// Actual size
        got: usize,
    },

    /// Regeneration could not assemble the target scenario count.
    #[error(
        "Scenario count mismatch: assembled {assembled} of {target} scenarios after {iterations} regeneration rounds"
    )]
    ScenarioCountMismatch {
        /// Requested number of scenarios
        target: usize,
        /// Scenarios without a bound breach
        assembled: usize,
        /// Regeneration rounds performed
        iterations: usize,
    },

    /// No Hull-White parameters were configured and no swaption quotes were supplied.
    #[error("Hull-White parameters missing: configure them or supply swaption quotes")]
    MissingHullWhiteParameters,
}

impl EngineError {
    /// Dimension mismatch for `what`.
    pub fn dimension(what: &'static str, expected: usize, got: usize) -> Self {
        EngineError::DimensionMismatch {
            what,
            expected,
            got,
        }
    }

    /// Check `got == expected`.
    pub(crate) fn check_dimension(what: &'static str, expected: usize, got: usize) -> Result<(), Self> {
        if expected == got {
            Ok(())
        } else {
            Err(Self::dimension(what, expected, got))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "Validation errors: a; b");
    }

    #[test]
    fn test_count_mismatch_display() {
        let err = EngineError::ScenarioCountMismatch {
            target: 1000,
            assembled: 998,
            iterations: 50,
        };
        let msg = err.to_string();
        assert!(msg.contains("998"));
        assert!(msg.contains("1000"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn test_calibration_error_converts() {
        let err: EngineError = CalibrationError::insufficient_data(4, 2).into();
        assert!(matches!(err, EngineError::Calibration(_)));
        assert!(EngineError::check_dimension("paths", 4, 4).is_ok());
        assert!(EngineError::check_dimension("paths", 4, 3).is_err());
    }
}
