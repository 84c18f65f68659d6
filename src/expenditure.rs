//! Energy expenditure
//!
//! Combines resting metabolism, activity energy expenditure (AEE) and the
//! thermic effect of food (TEF) into total energy expenditure (TEE), then
//! derives the day's energy balance.

use crate::constants::{KCAL_PER_STEP, TEF_RATE};
use crate::types::BandSignalBundle;

/// Expenditure components for one day (kcal, unrounded)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpenditureBreakdown {
    pub rmr: f64,
    pub aee: f64,
    pub tef: f64,
    pub tee: f64,
}

/// Expenditure engine
pub struct ExpenditureEngine;

impl ExpenditureEngine {
    /// Activity energy expenditure.
    ///
    /// Sums the band's activity readings. When that sum is zero the step count
    /// is used as a coarse proxy instead; the two sources are never added.
    pub fn activity(band: &BandSignalBundle, steps: f64) -> f64 {
        let burned: f64 = band
            .activity
            .iter()
            .map(|a| a.total_calories_burned)
            .sum();

        if burned != 0.0 {
            burned
        } else {
            steps * KCAL_PER_STEP
        }
    }

    /// Thermic effect of food for a bias-adjusted intake
    pub fn thermic_effect(adjusted_intake_kcal: f64) -> f64 {
        TEF_RATE * adjusted_intake_kcal
    }

    /// Total energy expenditure, scaled by the expenditure correction factor
    pub fn total(rmr: f64, aee: f64, tef: f64, exp_correction: f64) -> f64 {
        (rmr + aee + tef) * exp_correction
    }

    /// Compute every expenditure component for the day
    pub fn breakdown(
        rmr: f64,
        band: &BandSignalBundle,
        steps: f64,
        adjusted_intake_kcal: f64,
        exp_correction: f64,
    ) -> ExpenditureBreakdown {
        let aee = Self::activity(band, steps);
        let tef = Self::thermic_effect(adjusted_intake_kcal);
        let tee = Self::total(rmr, aee, tef, exp_correction);

        ExpenditureBreakdown { rmr, aee, tef, tee }
    }
}

/// Energy balance: positive is a surplus, negative a deficit
pub fn energy_balance(adjusted_intake_kcal: f64, tee: f64) -> f64 {
    adjusted_intake_kcal - tee
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityReading;

    fn band_with_activity(kcal: &[f64]) -> BandSignalBundle {
        BandSignalBundle {
            activity: kcal
                .iter()
                .map(|&total_calories_burned| ActivityReading {
                    total_calories_burned,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_activity_sum_takes_precedence_over_steps() {
        let band = band_with_activity(&[120.0, 180.0]);
        assert_eq!(ExpenditureEngine::activity(&band, 10_000.0), 300.0);
    }

    #[test]
    fn test_steps_fallback_without_activity() {
        let band = BandSignalBundle::default();
        assert!((ExpenditureEngine::activity(&band, 8000.0) - 320.0).abs() < 1e-9);
        assert_eq!(ExpenditureEngine::activity(&band, 0.0), 0.0);
    }

    #[test]
    fn test_steps_fallback_when_activity_sums_to_zero() {
        let band = band_with_activity(&[0.0, 0.0]);
        assert!((ExpenditureEngine::activity(&band, 5000.0) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_thermic_effect() {
        assert!((ExpenditureEngine::thermic_effect(2400.0) - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_and_balance() {
        let band = band_with_activity(&[400.0]);
        let breakdown = ExpenditureEngine::breakdown(1600.0, &band, 0.0, 2400.0, 1.1);

        assert_eq!(breakdown.aee, 400.0);
        assert!((breakdown.tef - 240.0).abs() < 1e-9);
        // (1600 + 400 + 240) * 1.1
        assert!((breakdown.tee - 2464.0).abs() < 1e-9);
        assert!((energy_balance(2400.0, breakdown.tee) + 64.0).abs() < 1e-9);
    }
}
