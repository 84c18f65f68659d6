//! Core types for the energy balance engine
//!
//! This module defines the data that flows through each stage: the profile and
//! per-day input material, the heterogeneous health-metric records, and the
//! final daily energy balance report.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Gender as used by the Mifflin-St Jeor equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Other,
}

impl Gender {
    /// Map a provider label onto the model's two classes (case-insensitive)
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("male") {
            Gender::Male
        } else {
            Gender::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Other => "other",
        }
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Gender::from_label(&label))
    }
}

/// A single macro goal from the user's profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroGoal {
    pub goal: f64,
    pub target: f64,
}

/// Optional per-macro goals attached to a profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroGoals {
    #[serde(default)]
    pub protein: Option<MacroGoal>,
    #[serde(default)]
    pub carbs: Option<MacroGoal>,
    #[serde(default)]
    pub fat: Option<MacroGoal>,
}

fn default_height_cm() -> f64 {
    170.0
}

fn default_age() -> f64 {
    30.0
}

/// User profile as returned by the profile provider.
///
/// Weight is optional here because providers may omit it; the engine requires
/// it from either the profile or an explicit current weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, alias = "weight")]
    pub weight_kg: Option<f64>,
    #[serde(default = "default_height_cm")]
    pub height_cm: f64,
    #[serde(default = "default_age")]
    pub age: f64,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macro_goals: Option<MacroGoals>,
}

impl Profile {
    pub fn new(weight_kg: f64, height_cm: f64, age: f64, gender: Gender) -> Self {
        Self {
            weight_kg: Some(weight_kg),
            height_cm,
            age,
            gender,
            macro_goals: None,
        }
    }
}

/// A scalar wearable reading (heart rate, HRV, glucose)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub value: f64,
}

/// An activity reading from the band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityReading {
    #[serde(rename = "totalCaloriesBurned")]
    pub total_calories_burned: f64,
}

/// Treat an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One calendar day of band signals.
///
/// Every signal is optional on the wire; an absent signal is an empty sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BandSignalBundle {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hr: Vec<Reading>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hrv: Vec<Reading>,
    #[serde(default, alias = "glucose", deserialize_with = "null_as_default")]
    pub cgm: Vec<Reading>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub activity: Vec<ActivityReading>,
}

impl BandSignalBundle {
    pub fn hr_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.hr.iter().map(|r| r.value)
    }

    pub fn hrv_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.hrv.iter().map(|r| r.value)
    }

    pub fn cgm_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.cgm.iter().map(|r| r.value)
    }
}

/// Inner value of a nested metrics record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub value: f64,
}

/// A health-metrics entry in one of the two shapes providers emit.
///
/// Entries that match neither shape are preserved as `Unrecognized` so the
/// extractor can report and skip them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HealthMetricRecord {
    /// `{"metric": "...", "value": n}`
    Flat { metric: String, value: f64 },
    /// `{"metrics": {"name": {"value": n}, ...}}`
    Nested {
        metrics: BTreeMap<String, MetricValue>,
    },
    Unrecognized(Value),
}

impl HealthMetricRecord {
    pub fn flat(metric: &str, value: f64) -> Self {
        HealthMetricRecord::Flat {
            metric: metric.to_string(),
            value,
        }
    }

    /// Classify a raw JSON entry by shape
    pub fn from_value(value: Value) -> Self {
        let map = match value {
            Value::Object(map) => map,
            other => return HealthMetricRecord::Unrecognized(other),
        };

        if map.contains_key("metric") {
            let name = map.get("metric").and_then(Value::as_str).map(str::to_string);
            if let Some(metric) = name {
                let value = map.get("value").and_then(Value::as_f64).unwrap_or(0.0);
                return HealthMetricRecord::Flat { metric, value };
            }
        } else if let Some(Value::Object(inner)) = map.get("metrics") {
            let metrics = inner
                .iter()
                .filter_map(|(name, entry)| match entry {
                    // Empty inner objects carry nothing and are ignored
                    Value::Object(fields) if !fields.is_empty() => Some((
                        name.clone(),
                        MetricValue {
                            value: fields.get("value").and_then(Value::as_f64).unwrap_or(0.0),
                        },
                    )),
                    _ => None,
                })
                .collect();
            return HealthMetricRecord::Nested { metrics };
        }

        HealthMetricRecord::Unrecognized(Value::Object(map))
    }
}

impl<'de> Deserialize<'de> for HealthMetricRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(HealthMetricRecord::from_value(value))
    }
}

/// Date (ISO `YYYY-MM-DD`) to weight in kg; ordered by date
pub type HistoricalWeights = BTreeMap<String, f64>;

/// Risk flag raised when an input had to be defaulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskFlag {
    #[serde(rename = "food_log_missing")]
    FoodLogMissing,
    #[serde(rename = "wearable_HR_incomplete")]
    WearableHrIncomplete,
    #[serde(rename = "weight_history_missing")]
    WeightHistoryMissing,
}

impl RiskFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFlag::FoodLogMissing => "food_log_missing",
            RiskFlag::WearableHrIncomplete => "wearable_HR_incomplete",
            RiskFlag::WeightHistoryMissing => "weight_history_missing",
        }
    }
}

/// Direction of the multi-day balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Deficit,
    Surplus,
    Balance,
}

impl TrendLabel {
    /// Classify a signed change: negative is a deficit, positive a surplus
    pub fn from_delta(delta: f64) -> Self {
        if delta < 0.0 {
            TrendLabel::Deficit
        } else if delta > 0.0 {
            TrendLabel::Surplus
        } else {
            TrendLabel::Balance
        }
    }
}

/// Insulin sensitivity heuristic outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsulinSensitivity {
    Monitor,
    Stable,
}

/// Everything needed to build one day's report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyInput {
    /// Report date (YYYY-MM-DD)
    pub date: String,
    pub profile: Profile,
    #[serde(default, deserialize_with = "null_as_default")]
    pub band_data: BandSignalBundle,
    #[serde(default, deserialize_with = "null_as_default")]
    pub health_metrics: Vec<HealthMetricRecord>,
    #[serde(default)]
    pub historical_weights: Option<HistoricalWeights>,
    #[serde(default)]
    pub current_weight: Option<f64>,
    /// Overrides the calibration strategy when present
    #[serde(default)]
    pub bias_factor: Option<f64>,
    /// Overrides the calibration strategy when present
    #[serde(default)]
    pub exp_correction: Option<f64>,
}

impl DailyInput {
    pub fn new(date: &str, profile: Profile) -> Self {
        Self {
            date: date.to_string(),
            profile,
            band_data: BandSignalBundle::default(),
            health_metrics: Vec::new(),
            historical_weights: None,
            current_weight: None,
            bias_factor: None,
            exp_correction: None,
        }
    }
}

/// Energy balance section of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyBalanceSection {
    pub estimate_kcal: i64,
    pub confidence_range_kcal: [i64; 2],
    pub trend_14d: TrendLabel,
    pub risk_flags: Vec<RiskFlag>,
}

/// Macronutrients in grams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    pub protein_g: i64,
    pub carbs_g: i64,
    pub fat_g: i64,
}

/// Intake section of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeSection {
    pub logged_kcal: i64,
    pub bias_adjusted_kcal: i64,
    pub macros: Macros,
    pub confidence: f64,
}

/// Expenditure section of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenditureSection {
    #[serde(rename = "RMR_kcal")]
    pub rmr_kcal: i64,
    #[serde(rename = "AEE_kcal")]
    pub aee_kcal: i64,
    #[serde(rename = "TEF_kcal")]
    pub tef_kcal: i64,
    #[serde(rename = "TEE_kcal")]
    pub tee_kcal: i64,
    pub confidence: f64,
}

/// Body metrics section of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyMetricsSection {
    pub weight_kg: f64,
    /// Latest minus earliest weight, one decimal
    pub weight_trend_14d: f64,
    pub confidence: f64,
}

/// Calibration factors that were applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSection {
    pub intake_bias_factor: f64,
    pub expenditure_correction_factor: f64,
}

/// Optional CGM-derived metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionalMetricsSection {
    pub cgm_mean_glucose: Option<i64>,
    pub cgm_variability: Option<i64>,
    pub insulin_sensitivity_flag: InsulinSensitivity,
}

/// Complete daily energy balance report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEnergyBalanceReport {
    pub date: String,
    pub energy_balance: EnergyBalanceSection,
    pub intake: IntakeSection,
    pub expenditure: ExpenditureSection,
    pub body_metrics: BodyMetricsSection,
    pub calibration: CalibrationSection,
    pub optional_metrics: OptionalMetricsSection,
}
