//! Engine configuration
//!
//! Defaults mirror the constants module; a JSON file or CLI flags may
//! override them.

use crate::calibration::CalibrationFactors;
use crate::constants::{CALIBRATION_WINDOW, DEFAULT_BIAS_FACTOR, DEFAULT_EXP_CORRECTION};
use crate::error::ComputeError;
use serde::{Deserialize, Serialize};

/// Runtime configuration for report generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Intake bias factor used when neither the input nor a calibration
    /// strategy supplies one
    pub bias_factor: Option<f64>,
    /// Expenditure correction used likewise
    pub exp_correction: Option<f64>,
    /// Trailing days fetched for trend and calibration
    pub calibration_window_days: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bias_factor: None,
            exp_correction: None,
            calibration_window_days: CALIBRATION_WINDOW,
        }
    }
}

impl EngineConfig {
    /// Load configuration from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ComputeError> {
        serde_json::to_string_pretty(self).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.calibration_window_days == 0 {
            return Err(ComputeError::ParseError(
                "calibration_window_days must be at least 1".to_string(),
            ));
        }
        self.fixed_factors().map(|_| ())
    }

    /// Factors pinned by configuration, if any.
    ///
    /// A partially pinned pair fills the other half from the defaults.
    pub fn fixed_factors(&self) -> Result<Option<CalibrationFactors>, ComputeError> {
        match (self.bias_factor, self.exp_correction) {
            (None, None) => Ok(None),
            (bias, correction) => CalibrationFactors::new(
                bias.unwrap_or(DEFAULT_BIAS_FACTOR),
                correction.unwrap_or(DEFAULT_EXP_CORRECTION),
            )
            .map(Some),
        }
    }
}
