//! Report assembly
//!
//! Drives every stage for one day of input and composes the results into a
//! [`DailyEnergyBalanceReport`]. The only policy applied here is rounding.

use crate::calibration::CalibrationFactors;
use crate::error::ComputeError;
use crate::expenditure::{energy_balance, ExpenditureEngine};
use crate::extractor::MetricExtractor;
use crate::rmr::{assess_resting_hr, mean_hrv, RmrEngine};
use crate::trend::{assess_weight_trend, insulin_sensitivity, GlucoseStats};
use crate::types::{
    BodyMetricsSection, CalibrationSection, DailyEnergyBalanceReport, DailyInput,
    EnergyBalanceSection, ExpenditureSection, IntakeSection, Macros, OptionalMetricsSection,
};
use crate::uncertainty::{ConfidenceBand, ConfidenceScores};
use chrono::NaiveDate;
use tracing::debug;

/// Round a kcal (or gram) figure to the nearest integer, halves away from zero
fn round_whole(value: f64) -> i64 {
    value.round() as i64
}

/// Round to a fixed number of decimals
fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    // Adding 0.0 folds a negative zero into zero
    (value * scale).round() / scale + 0.0
}

/// Builds daily energy balance reports
pub struct ReportAssembler;

impl ReportAssembler {
    /// Resolve the body weight for the day.
    ///
    /// An explicit non-zero current weight wins over the profile weight. With
    /// neither, the caller must supply one.
    pub fn resolve_weight(input: &DailyInput) -> Result<f64, ComputeError> {
        input
            .current_weight
            .filter(|w| *w != 0.0)
            .or(input.profile.weight_kg)
            .ok_or_else(|| ComputeError::MissingField("weight_kg".to_string()))
    }

    /// Assemble the report for one day with the given calibration factors
    pub fn assemble(
        input: &DailyInput,
        factors: CalibrationFactors,
    ) -> Result<DailyEnergyBalanceReport, ComputeError> {
        NaiveDate::parse_from_str(&input.date, "%Y-%m-%d")
            .map_err(|e| ComputeError::DateParseError(format!("{}: {e}", input.date)))?;

        let weight_kg = Self::resolve_weight(input)?;
        let profile = &input.profile;
        let band = &input.band_data;
        let mut flags = Vec::new();

        // Intake
        let metrics = MetricExtractor::assess_daily(&input.health_metrics).drain_into(&mut flags);
        let adjusted_intake = metrics.intake_kcal * factors.bias_factor;

        // Resting metabolism
        let rmr_baseline = RmrEngine::baseline(weight_kg, profile.height_cm, profile.age, profile.gender);
        let resting_hr = assess_resting_hr(band).drain_into(&mut flags);
        let hrv = mean_hrv(band);
        let rmr = RmrEngine::refine(rmr_baseline, resting_hr, Some(hrv));

        // Expenditure and balance
        let expenditure = ExpenditureEngine::breakdown(
            rmr,
            band,
            metrics.steps,
            adjusted_intake,
            factors.exp_correction,
        );
        let eb = energy_balance(adjusted_intake, expenditure.tee);
        let range = ConfidenceBand::from_components(eb, &expenditure, adjusted_intake);

        // Trend
        let trend = assess_weight_trend(input.historical_weights.as_ref()).drain_into(&mut flags);

        let has_weight_data = input.current_weight.is_some_and(|w| w != 0.0)
            || input
                .historical_weights
                .as_ref()
                .is_some_and(|weights| !weights.is_empty());
        let scores = ConfidenceScores::from_flags(&flags, has_weight_data);

        let glucose = GlucoseStats::from_band(band);

        debug!(
            date = %input.date,
            gender = profile.gender.as_str(),
            rmr_baseline,
            resting_hr,
            hrv,
            rmr,
            aee = expenditure.aee,
            tef = expenditure.tef,
            tee = expenditure.tee,
            eb,
            flags = flags.len(),
            "computed daily energy balance"
        );

        Ok(DailyEnergyBalanceReport {
            date: input.date.clone(),
            energy_balance: EnergyBalanceSection {
                estimate_kcal: round_whole(eb),
                confidence_range_kcal: [round_whole(range.low), round_whole(range.high)],
                trend_14d: trend.label,
                risk_flags: flags,
            },
            intake: IntakeSection {
                logged_kcal: round_whole(metrics.intake_kcal),
                bias_adjusted_kcal: round_whole(adjusted_intake),
                macros: Macros {
                    protein_g: round_whole(metrics.protein_g),
                    carbs_g: round_whole(metrics.carbs_g),
                    fat_g: round_whole(metrics.fat_g),
                },
                confidence: scores.intake,
            },
            expenditure: ExpenditureSection {
                rmr_kcal: round_whole(expenditure.rmr),
                aee_kcal: round_whole(expenditure.aee),
                tef_kcal: round_whole(expenditure.tef),
                tee_kcal: round_whole(expenditure.tee),
                confidence: scores.expenditure,
            },
            body_metrics: BodyMetricsSection {
                weight_kg,
                weight_trend_14d: round_to(trend.delta_kg, 1),
                confidence: scores.body,
            },
            calibration: CalibrationSection {
                intake_bias_factor: round_to(factors.bias_factor, 2),
                expenditure_correction_factor: round_to(factors.exp_correction, 2),
            },
            optional_metrics: OptionalMetricsSection {
                cgm_mean_glucose: glucose.map(|g| round_whole(g.mean)),
                cgm_variability: glucose.map(|g| round_whole(g.std_dev)),
                insulin_sensitivity_flag: insulin_sensitivity(glucose.as_ref()),
            },
        })
    }
}
