//! Controller construction errors.
//!
//! Runtime updates cannot fail; everything that could make the arithmetic
//! ill-defined is rejected here, once, when the controller is built.

use thiserror::Error;

use mgb_common::config::ConfigError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ControllerError {
    /// `output_min > output_max`, or a bound is NaN / infinite.
    #[error("invalid output bounds: min={min}, max={max}")]
    InvalidOutputBounds { min: f64, max: f64 },

    /// Gains must be finite and non-negative.
    #[error("invalid gain {name}={value}: must be finite and >= 0")]
    InvalidGain { name: &'static str, value: f64 },

    /// Learning rate outside the open interval (0, 1).
    #[error("invalid learning_rate {0}: must lie in (0, 1)")]
    InvalidLearningRate(f64),

    #[error("invalid adaptation_interval: must be at least 1")]
    InvalidAdaptationInterval,

    #[error("invalid setpoint {0}: must be finite")]
    InvalidSetpoint(f64),

    #[error("invalid integral_limit {0}: must be finite and > 0")]
    InvalidIntegralLimit(f64),
}

impl From<ControllerError> for ConfigError {
    fn from(err: ControllerError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}
