//! Pipeline orchestration
//!
//! This module provides the public API for the energy balance engine.
//! It resolves calibration factors and drives report assembly from a parsed
//! [`DailyInput`] or raw input JSON.

use crate::calibration::{
    CalibrationFactors, CalibrationHistory, CalibrationStrategy, DefaultCalibration,
};
use crate::config::EngineConfig;
use crate::constants::{DEFAULT_BIAS_FACTOR, DEFAULT_EXP_CORRECTION};
use crate::error::ComputeError;
use crate::report::ReportAssembler;
use crate::summary::DashboardSummary;
use crate::types::{DailyEnergyBalanceReport, DailyInput};

/// Compute the daily energy balance report for one input.
///
/// Factors given on the input are used as-is; missing ones fall back to
/// `(1.20, 1.00)`.
///
/// # Example
/// ```ignore
/// let input = DailyInput::new("2024-01-15", Profile::new(70.0, 170.0, 30.0, Gender::Male));
/// let report = compute_daily_metrics(&input)?;
/// ```
pub fn compute_daily_metrics(input: &DailyInput) -> Result<DailyEnergyBalanceReport, ComputeError> {
    let factors = CalibrationFactors::new(
        input.bias_factor.unwrap_or(DEFAULT_BIAS_FACTOR),
        input.exp_correction.unwrap_or(DEFAULT_EXP_CORRECTION),
    )?;
    ReportAssembler::assemble(input, factors)
}

/// Convert raw daily input JSON into the report JSON.
///
/// # Arguments
/// * `raw_json` - Serialized [`DailyInput`]
///
/// # Returns
/// The serialized [`DailyEnergyBalanceReport`]
pub fn daily_report_json(raw_json: String) -> Result<String, ComputeError> {
    let input: DailyInput = serde_json::from_str(&raw_json)?;
    let report = compute_daily_metrics(&input)?;
    encode(&report)
}

/// Convert raw daily input JSON into the dashboard summary JSON
pub fn daily_summary_json(raw_json: String) -> Result<String, ComputeError> {
    let input: DailyInput = serde_json::from_str(&raw_json)?;
    let report = compute_daily_metrics(&input)?;
    let summary = DashboardSummary::from_report(&report, input.profile.macro_goals.as_ref());
    encode(&summary)
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, ComputeError> {
    serde_json::to_string(value).map_err(|e| ComputeError::EncodingError(e.to_string()))
}

/// Configured processor with a pluggable calibration strategy.
///
/// Factor precedence per field: the input, then the configuration, then the
/// strategy's estimate from the input's weight history.
pub struct EnergyBalanceProcessor {
    config: EngineConfig,
    strategy: Box<dyn CalibrationStrategy>,
}

impl Default for EnergyBalanceProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl EnergyBalanceProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            strategy: Box::new(DefaultCalibration),
        }
    }

    /// Create a processor with the given configuration
    pub fn with_config(config: EngineConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            config,
            strategy: Box::new(DefaultCalibration),
        })
    }

    /// Replace the calibration strategy
    pub fn with_strategy(mut self, strategy: Box<dyn CalibrationStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve the factors to apply to `input`
    pub fn resolve_factors(&self, input: &DailyInput) -> Result<CalibrationFactors, ComputeError> {
        let configured = (
            input.bias_factor.or(self.config.bias_factor),
            input.exp_correction.or(self.config.exp_correction),
        );

        let (bias_factor, exp_correction) = match configured {
            (Some(bias), Some(correction)) => (bias, correction),
            (bias, correction) => {
                let history = input
                    .historical_weights
                    .as_ref()
                    .map(CalibrationHistory::from_weights)
                    .unwrap_or_default();
                let estimate = self.strategy.estimate(&history);
                (
                    bias.unwrap_or(estimate.bias_factor),
                    correction.unwrap_or(estimate.exp_correction),
                )
            }
        };

        CalibrationFactors::new(bias_factor, exp_correction)
    }

    /// Build the report for one input
    pub fn process(&self, input: &DailyInput) -> Result<DailyEnergyBalanceReport, ComputeError> {
        let factors = self.resolve_factors(input)?;
        ReportAssembler::assemble(input, factors)
    }

    /// Build the report for raw input JSON
    pub fn process_json(&self, raw_json: &str) -> Result<String, ComputeError> {
        let input: DailyInput = serde_json::from_str(raw_json)?;
        encode(&self.process(&input)?)
    }

    /// Build the dashboard summary for one input
    pub fn summarize(&self, input: &DailyInput) -> Result<DashboardSummary, ComputeError> {
        let report = self.process(input)?;
        Ok(DashboardSummary::from_report(
            &report,
            input.profile.macro_goals.as_ref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{meal_records, STEPS_TOTAL};
    use crate::types::{
        ActivityReading, BandSignalBundle, Gender, HealthMetricRecord, HistoricalWeights, Profile,
        Reading, RiskFlag, TrendLabel,
    };
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn sample_input_json() -> &'static str {
        r#"{
            "date": "2024-01-15",
            "profile": {"weight_kg": 80.0, "height_cm": 180.0, "age": 40, "gender": "male"},
            "band_data": {
                "hr": [{"value": 62}, {"value": 55}, {"value": 90}],
                "hrv": [{"value": 40}, {"value": 60}],
                "cgm": [{"value": 95}, {"value": 105}],
                "activity": [{"totalCaloriesBurned": 300}, {"totalCaloriesBurned": 150}]
            },
            "health_metrics": [
                {"metric": "energy_intake_total_kcal", "value": 2100},
                {"metric": "protein_total_g", "value": 120},
                {"metrics": {"carbs_total_g": {"value": 230}, "fat_total_g": {"value": 70}}},
                {"metric": "steps_total", "value": 9000}
            ],
            "historical_weights": {"2024-01-01": 80.6, "2024-01-15": 80.0}
        }"#
    }

    fn input(weight: f64) -> DailyInput {
        DailyInput::new("2024-01-15", Profile::new(weight, 170.0, 30.0, Gender::Male))
    }

    struct FixedCalibration(CalibrationFactors);

    impl CalibrationStrategy for FixedCalibration {
        fn estimate(&self, _history: &CalibrationHistory) -> CalibrationFactors {
            self.0
        }
    }

    #[test]
    fn test_daily_report_json_full_day() {
        let json = daily_report_json(sample_input_json().to_string()).unwrap();
        let report: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(report["date"], "2024-01-15");
        assert_eq!(report["intake"]["logged_kcal"], 2100);
        assert_eq!(report["intake"]["bias_adjusted_kcal"], 2520);
        assert_eq!(report["intake"]["macros"]["carbs_g"], 230);
        assert_eq!(report["expenditure"]["AEE_kcal"], 450);
        assert_eq!(report["expenditure"]["TEF_kcal"], 252);
        assert_eq!(report["energy_balance"]["trend_14d"], "deficit");
        assert_eq!(report["body_metrics"]["weight_trend_14d"], -0.6);
        assert_eq!(report["optional_metrics"]["cgm_mean_glucose"], 100);
        assert_eq!(report["optional_metrics"]["cgm_variability"], 5);
        assert_eq!(report["optional_metrics"]["insulin_sensitivity_flag"], "stable");
        assert_eq!(report["energy_balance"]["risk_flags"], serde_json::json!([]));
    }

    #[test]
    fn test_output_field_names() {
        let json = daily_report_json(sample_input_json().to_string()).unwrap();
        let report: Value = serde_json::from_str(&json).unwrap();

        let keys: Vec<&str> = report
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        for key in [
            "date",
            "energy_balance",
            "intake",
            "expenditure",
            "body_metrics",
            "calibration",
            "optional_metrics",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
        for key in ["RMR_kcal", "AEE_kcal", "TEF_kcal", "TEE_kcal", "confidence"] {
            assert!(report["expenditure"].get(key).is_some(), "missing {key}");
        }
        assert!(report["energy_balance"]["confidence_range_kcal"].is_array());
        assert!(report["calibration"]["intake_bias_factor"].is_f64());
    }

    #[test]
    fn test_idempotent_output() {
        let first = daily_report_json(sample_input_json().to_string()).unwrap();
        let second = daily_report_json(sample_input_json().to_string()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_estimate_within_confidence_range() {
        let cases: Vec<(f64, f64, f64, Vec<f64>)> = vec![
            (55.0, 0.0, 0.0, vec![]),
            (70.0, 1800.0, 4000.0, vec![70.0, 48.0]),
            (95.0, 3500.0, 12000.0, vec![85.0]),
            (120.0, 600.0, 0.0, vec![45.0, 50.0, 52.0]),
        ];

        for (weight, kcal, steps, hr) in cases {
            let mut day = input(weight);
            day.health_metrics = vec![
                HealthMetricRecord::flat("energy_intake_total_kcal", kcal),
                HealthMetricRecord::flat(STEPS_TOTAL, steps),
            ];
            day.band_data.hr = hr.into_iter().map(|value| Reading { value }).collect();

            let report = compute_daily_metrics(&day).unwrap();
            let [low, high] = report.energy_balance.confidence_range_kcal;
            let estimate = report.energy_balance.estimate_kcal;
            assert!(low <= estimate && estimate <= high, "{low} <= {estimate} <= {high}");
        }
    }

    #[test]
    fn test_empty_metrics_flags_food_log() {
        let report = compute_daily_metrics(&input(70.0)).unwrap();

        assert_eq!(report.intake.logged_kcal, 0);
        assert_eq!(report.intake.bias_adjusted_kcal, 0);
        assert_eq!(report.intake.macros.protein_g, 0);
        assert!((report.intake.confidence - 0.7).abs() < 1e-9);
        assert_eq!(
            report.energy_balance.risk_flags,
            vec![
                RiskFlag::FoodLogMissing,
                RiskFlag::WearableHrIncomplete,
                RiskFlag::WeightHistoryMissing,
            ]
        );
    }

    #[test]
    fn test_single_weight_entry_is_balanced() {
        let mut day = input(70.0);
        let mut weights = HistoricalWeights::new();
        weights.insert("2024-01-15".to_string(), 70.0);
        day.historical_weights = Some(weights);

        let report = compute_daily_metrics(&day).unwrap();
        assert_eq!(report.energy_balance.trend_14d, TrendLabel::Balance);
        assert_eq!(report.body_metrics.weight_trend_14d, 0.0);
        assert!(!report
            .energy_balance
            .risk_flags
            .contains(&RiskFlag::WeightHistoryMissing));
        assert_eq!(report.body_metrics.confidence, 0.9);
    }

    #[test]
    fn test_steps_fallback_when_no_activity() {
        let mut day = input(70.0);
        day.health_metrics = vec![HealthMetricRecord::flat(STEPS_TOTAL, 10000.0)];
        let report = compute_daily_metrics(&day).unwrap();
        assert_eq!(report.expenditure.aee_kcal, 400);

        day.band_data = BandSignalBundle {
            activity: vec![ActivityReading {
                total_calories_burned: 250.0,
            }],
            ..Default::default()
        };
        let report = compute_daily_metrics(&day).unwrap();
        assert_eq!(report.expenditure.aee_kcal, 250);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            daily_report_json("{not json".to_string()),
            Err(ComputeError::JsonError(_))
        ));
        assert!(matches!(
            daily_report_json(r#"{"profile": {"weight_kg": 70}}"#.to_string()),
            Err(ComputeError::JsonError(_))
        ));
    }

    #[test]
    fn test_input_factors_must_be_positive() {
        let mut day = input(70.0);
        day.bias_factor = Some(0.0);
        assert!(matches!(
            compute_daily_metrics(&day),
            Err(ComputeError::InvalidCalibration(_))
        ));
    }

    #[test]
    fn test_factor_precedence() {
        let strategy = FixedCalibration(CalibrationFactors {
            bias_factor: 1.5,
            exp_correction: 0.9,
        });
        let config = EngineConfig {
            exp_correction: Some(1.1),
            ..Default::default()
        };
        let processor = EnergyBalanceProcessor::with_config(config)
            .unwrap()
            .with_strategy(Box::new(strategy));

        // Strategy fills bias, config pins the correction
        let day = input(70.0);
        let factors = processor.resolve_factors(&day).unwrap();
        assert_eq!(factors.bias_factor, 1.5);
        assert_eq!(factors.exp_correction, 1.1);

        // Input wins over both
        let mut day = input(70.0);
        day.bias_factor = Some(1.0);
        day.exp_correction = Some(1.0);
        let factors = processor.resolve_factors(&day).unwrap();
        assert_eq!(factors, CalibrationFactors::new(1.0, 1.0).unwrap());
    }

    #[test]
    fn test_with_config_is_validated_and_kept() {
        let config = EngineConfig {
            calibration_window_days: 7,
            ..Default::default()
        };
        let processor = EnergyBalanceProcessor::with_config(config.clone()).unwrap();
        assert_eq!(processor.config(), &config);

        let invalid = EngineConfig {
            bias_factor: Some(-1.0),
            ..Default::default()
        };
        assert!(EnergyBalanceProcessor::with_config(invalid).is_err());
    }

    #[test]
    fn test_default_processor_matches_stateless_api() {
        let processor = EnergyBalanceProcessor::new();
        let stateless = daily_report_json(sample_input_json().to_string()).unwrap();
        assert_eq!(processor.process_json(sample_input_json()).unwrap(), stateless);
    }

    #[test]
    fn test_summary_json() {
        let mut day = input(70.0);
        day.health_metrics = meal_records(100.0, 200.0, 50.0);
        let json = daily_summary_json(serde_json::to_string(&day).unwrap()).unwrap();
        let summary: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(summary["todayMetrics"]["currentIntake"], 1650);
        assert_eq!(summary["macros"]["intake"]["protein"], 100);

        let processor = EnergyBalanceProcessor::new();
        let summary = processor.summarize(&day).unwrap();
        assert_eq!(summary.today_metrics.projected_intake, 1980);
    }
}
