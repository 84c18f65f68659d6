//! Calibration seam
//!
//! Supplies the intake bias factor and expenditure correction. The shipped
//! strategy returns fixed defaults; a statistical estimator (for example one
//! regressing logged intake against observed weight change) can replace it
//! behind [`CalibrationStrategy`] without touching callers.

use crate::constants::{DEFAULT_BIAS_FACTOR, DEFAULT_EXP_CORRECTION};
use crate::error::ComputeError;
use crate::types::HistoricalWeights;
use serde::{Deserialize, Serialize};

/// Intake bias and expenditure correction factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFactors {
    /// Multiplier on logged intake (> 0)
    pub bias_factor: f64,
    /// Multiplier on total expenditure (> 0)
    pub exp_correction: f64,
}

impl Default for CalibrationFactors {
    fn default() -> Self {
        Self {
            bias_factor: DEFAULT_BIAS_FACTOR,
            exp_correction: DEFAULT_EXP_CORRECTION,
        }
    }
}

impl CalibrationFactors {
    /// Create factors, rejecting non-positive or non-finite values
    pub fn new(bias_factor: f64, exp_correction: f64) -> Result<Self, ComputeError> {
        for (name, value) in [("bias_factor", bias_factor), ("exp_correction", exp_correction)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ComputeError::InvalidCalibration(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(Self {
            bias_factor,
            exp_correction,
        })
    }
}

/// History a calibration strategy may learn from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationHistory {
    /// Past daily energy balances (kcal)
    pub energy_balances: Vec<f64>,
    /// Observed day-over-day weight changes (kg)
    pub weight_changes: Vec<f64>,
}

impl CalibrationHistory {
    pub fn new(energy_balances: Vec<f64>, weight_changes: Vec<f64>) -> Self {
        Self {
            energy_balances,
            weight_changes,
        }
    }

    /// Build a history from a dated weight series, taking consecutive differences
    pub fn from_weights(weights: &HistoricalWeights) -> Self {
        let series: Vec<f64> = weights.values().copied().collect();
        let weight_changes = series.windows(2).map(|w| w[1] - w[0]).collect();
        Self {
            energy_balances: Vec::new(),
            weight_changes,
        }
    }
}

/// Strategy for estimating calibration factors from history
pub trait CalibrationStrategy: Send + Sync {
    fn estimate(&self, history: &CalibrationHistory) -> CalibrationFactors;
}

/// Fixed-default strategy: ignores history and returns `(1.20, 1.00)`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCalibration;

impl CalibrationStrategy for DefaultCalibration {
    fn estimate(&self, _history: &CalibrationHistory) -> CalibrationFactors {
        CalibrationFactors::default()
    }
}

/// Estimate `(bias_factor, exp_correction)` with the default strategy
pub fn calibrate(historical_energy_balances: &[f64], historical_weight_changes: &[f64]) -> (f64, f64) {
    let history = CalibrationHistory::new(
        historical_energy_balances.to_vec(),
        historical_weight_changes.to_vec(),
    );
    let factors = DefaultCalibration.estimate(&history);
    (factors.bias_factor, factors.exp_correction)
}
