//! Resting metabolic rate
//!
//! Baseline RMR from the Mifflin-St Jeor equation, refined by the day's resting
//! heart rate and heart-rate variability.

use crate::constants::{DEFAULT_HRV, DEFAULT_RESTING_HR};
use crate::types::{BandSignalBundle, Gender, RiskFlag};
use crate::uncertainty::Assessed;

/// HRV above which the refinement applies a small efficiency boost (ms)
const HIGH_HRV_THRESHOLD: f64 = 50.0;

/// Refinement boost for high HRV
const HIGH_HRV_BOOST: f64 = 0.05;

/// RMR engine
pub struct RmrEngine;

impl RmrEngine {
    /// Baseline RMR (kcal/day) from the Mifflin-St Jeor equation.
    ///
    /// `10*weight + 6.25*height - 5*age + s`, with `s = 5` for men and `-161`
    /// otherwise. Inputs are not range-checked.
    pub fn baseline(weight_kg: f64, height_cm: f64, age: f64, gender: Gender) -> f64 {
        let s = match gender {
            Gender::Male => 5.0,
            Gender::Other => -161.0,
        };
        10.0 * weight_kg + 6.25 * height_cm - 5.0 * age + s
    }

    /// Scale the baseline by heart-rate derived efficiency.
    ///
    /// Lower resting HR raises the factor linearly (1% per bpm below 60) and an
    /// HRV above 50 ms adds 5%.
    pub fn refine(baseline: f64, resting_hr: f64, hrv: Option<f64>) -> f64 {
        baseline * Self::refinement_factor(resting_hr, hrv)
    }

    pub fn refinement_factor(resting_hr: f64, hrv: Option<f64>) -> f64 {
        let mut factor = 1.0 + (DEFAULT_RESTING_HR - resting_hr) / 100.0;
        if hrv.is_some_and(|v| v > HIGH_HRV_THRESHOLD) {
            factor += HIGH_HRV_BOOST;
        }
        factor
    }
}

/// Resting HR for the day: the lowest recorded value, or 60 bpm without readings
pub fn resting_hr(band: &BandSignalBundle) -> f64 {
    band.hr_values()
        .reduce(f64::min)
        .unwrap_or(DEFAULT_RESTING_HR)
}

/// Resting HR, flagged as incomplete when the day has no HR readings
pub fn assess_resting_hr(band: &BandSignalBundle) -> Assessed<f64> {
    if band.hr.is_empty() {
        Assessed::flagged(DEFAULT_RESTING_HR, RiskFlag::WearableHrIncomplete)
    } else {
        Assessed::clean(resting_hr(band))
    }
}

/// Mean HRV for the day, or 50 ms without readings
pub fn mean_hrv(band: &BandSignalBundle) -> f64 {
    if band.hrv.is_empty() {
        return DEFAULT_HRV;
    }
    band.hrv_values().sum::<f64>() / band.hrv.len() as f64
}
