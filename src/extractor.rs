//! Metric extraction
//!
//! Health-metric providers emit records in two incompatible shapes, sometimes
//! mixed within one response. This module resolves a named metric across both
//! and degrades to zero when the metric is absent.

use crate::types::{HealthMetricRecord, RiskFlag};
use crate::uncertainty::Assessed;
use tracing::warn;

/// Logged energy intake (kcal)
pub const ENERGY_INTAKE_TOTAL_KCAL: &str = "energy_intake_total_kcal";
/// Logged protein (g)
pub const PROTEIN_TOTAL_G: &str = "protein_total_g";
/// Logged carbohydrates (g)
pub const CARBS_TOTAL_G: &str = "carbs_total_g";
/// Logged fat (g)
pub const FAT_TOTAL_G: &str = "fat_total_g";
/// Step count for the day
pub const STEPS_TOTAL: &str = "steps_total";

/// Atwater energy densities (kcal per gram)
const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

/// Metric extractor over heterogeneous health-metric records
pub struct MetricExtractor;

impl MetricExtractor {
    /// Return the value of the first record carrying `target`, or 0 if none does.
    ///
    /// Unrecognized records are skipped with a warning and never abort the scan.
    pub fn extract(records: &[HealthMetricRecord], target: &str) -> f64 {
        for record in records {
            match record {
                HealthMetricRecord::Flat { metric, value } => {
                    if metric == target {
                        return *value;
                    }
                }
                HealthMetricRecord::Nested { metrics } => {
                    if let Some(inner) = metrics.get(target) {
                        return inner.value;
                    }
                }
                HealthMetricRecord::Unrecognized(raw) => {
                    warn!(target_metric = target, entry = %raw, "skipping unrecognized health_metrics entry");
                }
            }
        }
        0.0
    }

    /// Extract all metrics the engine consumes in one pass over the names
    pub fn extract_daily(records: &[HealthMetricRecord]) -> DailyMetrics {
        DailyMetrics {
            intake_kcal: Self::extract(records, ENERGY_INTAKE_TOTAL_KCAL),
            protein_g: Self::extract(records, PROTEIN_TOTAL_G),
            carbs_g: Self::extract(records, CARBS_TOTAL_G),
            fat_g: Self::extract(records, FAT_TOTAL_G),
            steps: Self::extract(records, STEPS_TOTAL),
        }
    }

    /// Extract the day's metrics, flagging a missing food log when intake is zero
    pub fn assess_daily(records: &[HealthMetricRecord]) -> Assessed<DailyMetrics> {
        let metrics = Self::extract_daily(records);
        if metrics.intake_kcal == 0.0 {
            Assessed::flagged(metrics, RiskFlag::FoodLogMissing)
        } else {
            Assessed::clean(metrics)
        }
    }
}

/// Scalar metrics resolved from a day's health-metric records
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DailyMetrics {
    pub intake_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub steps: f64,
}

/// Build flat records for a logged meal, deriving energy from its macros
pub fn meal_records(protein_g: f64, carbs_g: f64, fat_g: f64) -> Vec<HealthMetricRecord> {
    let total_kcal =
        protein_g * KCAL_PER_G_PROTEIN + carbs_g * KCAL_PER_G_CARBS + fat_g * KCAL_PER_G_FAT;

    vec![
        HealthMetricRecord::flat(ENERGY_INTAKE_TOTAL_KCAL, total_kcal),
        HealthMetricRecord::flat(PROTEIN_TOTAL_G, protein_g),
        HealthMetricRecord::flat(CARBS_TOTAL_G, carbs_g),
        HealthMetricRecord::flat(FAT_TOTAL_G, fat_g),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetricValue;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn nested(entries: &[(&str, f64)]) -> HealthMetricRecord {
        let metrics: BTreeMap<String, MetricValue> = entries
            .iter()
            .map(|(name, value)| (name.to_string(), MetricValue { value: *value }))
            .collect();
        HealthMetricRecord::Nested { metrics }
    }

    #[test]
    fn test_extract_flat() {
        let records = vec![
            HealthMetricRecord::flat(STEPS_TOTAL, 8000.0),
            HealthMetricRecord::flat(ENERGY_INTAKE_TOTAL_KCAL, 2100.0),
        ];
        assert_eq!(MetricExtractor::extract(&records, ENERGY_INTAKE_TOTAL_KCAL), 2100.0);
        assert_eq!(MetricExtractor::extract(&records, STEPS_TOTAL), 8000.0);
    }

    #[test]
    fn test_extract_nested() {
        let records = vec![nested(&[(PROTEIN_TOTAL_G, 120.0), (FAT_TOTAL_G, 60.0)])];
        assert_eq!(MetricExtractor::extract(&records, FAT_TOTAL_G), 60.0);
    }

    #[test]
    fn test_first_match_wins_across_shapes() {
        let records = vec![
            nested(&[(CARBS_TOTAL_G, 150.0)]),
            HealthMetricRecord::flat(CARBS_TOTAL_G, 999.0),
        ];
        assert_eq!(MetricExtractor::extract(&records, CARBS_TOTAL_G), 150.0);
    }

    #[test]
    fn test_missing_metric_is_zero() {
        assert_eq!(MetricExtractor::extract(&[], ENERGY_INTAKE_TOTAL_KCAL), 0.0);

        let records = vec![HealthMetricRecord::flat(STEPS_TOTAL, 4000.0)];
        assert_eq!(MetricExtractor::extract(&records, PROTEIN_TOTAL_G), 0.0);
    }

    #[test]
    fn test_unrecognized_entries_are_skipped() {
        let records = vec![
            HealthMetricRecord::Unrecognized(json!({"kind": "water", "ml": 500})),
            HealthMetricRecord::flat(ENERGY_INTAKE_TOTAL_KCAL, 1800.0),
        ];
        assert_eq!(MetricExtractor::extract(&records, ENERGY_INTAKE_TOTAL_KCAL), 1800.0);
    }

    #[test]
    fn test_extract_daily_mixed_payload() {
        let records: Vec<HealthMetricRecord> = serde_json::from_value(json!([
            {"metric": "energy_intake_total_kcal", "value": 2250},
            {"metrics": {"protein_total_g": {"value": 130}, "carbs_total_g": {"value": 240}}},
            "garbage",
            {"metric": "fat_total_g", "value": 70.4}
        ]))
        .unwrap();

        let daily = MetricExtractor::extract_daily(&records);
        assert_eq!(daily.intake_kcal, 2250.0);
        assert_eq!(daily.protein_g, 130.0);
        assert_eq!(daily.carbs_g, 240.0);
        assert_eq!(daily.fat_g, 70.4);
        assert_eq!(daily.steps, 0.0);
    }

    #[test]
    fn test_assess_daily_flags_empty_food_log() {
        let assessed = MetricExtractor::assess_daily(&[]);
        assert_eq!(assessed.value, DailyMetrics::default());
        assert_eq!(assessed.flags, vec![RiskFlag::FoodLogMissing]);

        let assessed = MetricExtractor::assess_daily(&meal_records(20.0, 40.0, 10.0));
        assert!(assessed.flags.is_empty());
        assert_eq!(assessed.value.intake_kcal, 330.0);
    }

    #[test]
    fn test_meal_records_use_atwater_factors() {
        let records = meal_records(30.0, 50.0, 10.0);
        // 30*4 + 50*4 + 10*9 = 410
        assert_eq!(MetricExtractor::extract(&records, ENERGY_INTAKE_TOTAL_KCAL), 410.0);
        assert_eq!(MetricExtractor::extract(&records, CARBS_TOTAL_G), 50.0);
    }
}
