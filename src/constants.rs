//! Physiological and uncertainty constants
//!
//! Shared coefficients used across the engine, plus the two pure functions
//! every stage leans on: uncertainty propagation and confidence scoring.

/// Multiplier applied to logged intake to correct for systematic underreporting (20%)
pub const DEFAULT_BIAS_FACTOR: f64 = 1.20;

/// Multiplier applied to total expenditure
pub const DEFAULT_EXP_CORRECTION: f64 = 1.00;

/// Relative uncertainty of self-reported food data (and food-derived TEF)
pub const UNCERTAINTY_FOOD: f64 = 0.25;

/// Relative uncertainty of wearable-derived activity expenditure
pub const UNCERTAINTY_WEARABLE: f64 = 0.20;

/// Relative uncertainty of the resting metabolic rate model
pub const UNCERTAINTY_RMR: f64 = 0.10;

/// Thermic effect of food as a fraction of adjusted intake
pub const TEF_RATE: f64 = 0.10;

/// Rough kcal burned per step, used when no activity readings exist
pub const KCAL_PER_STEP: f64 = 0.04;

/// Confidence lost per raised risk flag
pub const CONFIDENCE_DECAY_PER_FLAG: f64 = 0.1;

/// Lower bound for any flag-derived confidence score
pub const MIN_CONFIDENCE: f64 = 0.5;

/// Trailing days used for weight trend and calibration
pub const CALIBRATION_WINDOW: usize = 14;

/// Resting heart rate assumed when the day has no HR readings (bpm)
pub const DEFAULT_RESTING_HR: f64 = 60.0;

/// HRV assumed when the day has no HRV readings (ms)
pub const DEFAULT_HRV: f64 = 50.0;

/// Calculate a confidence score from the number of missing-data flags.
///
/// Starts at 1.0 and loses [`CONFIDENCE_DECAY_PER_FLAG`] per flag, never
/// dropping below [`MIN_CONFIDENCE`].
pub fn calculate_confidence<T>(missing_data_flags: &[T]) -> f64 {
    let conf = 1.0 - CONFIDENCE_DECAY_PER_FLAG * missing_data_flags.len() as f64;
    conf.max(MIN_CONFIDENCE)
}

/// Propagate per-source uncertainty for the energy balance range.
///
/// Returns `(epsilon_in, epsilon_out)`, both non-negative magnitudes.
/// Expenditure components are treated as independent and combined in
/// quadrature; intake carries a flat relative error.
pub fn propagate_uncertainty(rmr: f64, aee: f64, tef: f64, intake: f64) -> (f64, f64) {
    let epsilon_out = ((UNCERTAINTY_RMR * rmr).powi(2)
        + (UNCERTAINTY_WEARABLE * aee).powi(2)
        + (UNCERTAINTY_FOOD * tef).powi(2))
    .sqrt();
    let epsilon_in = (UNCERTAINTY_FOOD * intake).abs();
    (epsilon_in, epsilon_out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_without_flags() {
        let flags: [&str; 0] = [];
        assert!((calculate_confidence(&flags) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_decays_per_flag() {
        assert!((calculate_confidence(&["a"]) - 0.9).abs() < 1e-9);
        assert!((calculate_confidence(&["a", "b", "c"]) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_floor_and_monotonic() {
        let mut previous = f64::MAX;
        for n in 0..12 {
            let flags = vec![(); n];
            let conf = calculate_confidence(flags.as_slice());
            assert!((MIN_CONFIDENCE..=1.0).contains(&conf));
            assert!(conf <= previous);
            previous = conf;
        }
        assert!((calculate_confidence(&[(); 9]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_propagate_uncertainty() {
        let (eps_in, eps_out) = propagate_uncertainty(1500.0, 400.0, 240.0, 2400.0);
        assert!((eps_in - 600.0).abs() < 1e-9);
        // sqrt(150^2 + 80^2 + 60^2) = sqrt(22500 + 6400 + 3600)
        let expected = (32500.0_f64).sqrt();
        assert!((eps_out - expected).abs() < 1e-9);
    }

    #[test]
    fn test_propagate_uncertainty_negative_intake_is_magnitude() {
        let (eps_in, eps_out) = propagate_uncertainty(1500.0, 0.0, -240.0, -2400.0);
        assert!((eps_in - 600.0).abs() < 1e-9);
        assert!((eps_out - (150.0_f64.powi(2) + 60.0_f64.powi(2)).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_propagate_uncertainty_zero_inputs() {
        let (eps_in, eps_out) = propagate_uncertainty(0.0, 0.0, 0.0, 0.0);
        assert_eq!(eps_in, 0.0);
        assert_eq!(eps_out, 0.0);
    }
}
