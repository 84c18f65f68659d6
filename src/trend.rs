//! Weight trend and optional glucose signals
//!
//! - Multi-day weight trend from the historical weight series
//! - CGM mean and variability for the day
//! - Insulin sensitivity heuristic

use crate::types::{BandSignalBundle, HistoricalWeights, InsulinSensitivity, RiskFlag, TrendLabel};
use crate::uncertainty::Assessed;

/// Mean glucose (mg/dL) above which variability is checked
const GLUCOSE_MEAN_THRESHOLD: f64 = 100.0;

/// Glucose standard deviation (mg/dL) above which an elevated mean warrants monitoring
const GLUCOSE_VARIABILITY_THRESHOLD: f64 = 15.0;

/// Weight change over the series and its direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightTrend {
    /// Latest minus earliest weight (kg)
    pub delta_kg: f64,
    pub label: TrendLabel,
}

impl WeightTrend {
    pub fn flat() -> Self {
        Self {
            delta_kg: 0.0,
            label: TrendLabel::Balance,
        }
    }

    /// Trend over a dated series. Fewer than two points gives a flat trend.
    pub fn from_series(weights: &HistoricalWeights) -> Self {
        // BTreeMap iterates ISO dates in chronological order
        let mut series = weights.values();
        match (series.next(), series.next_back()) {
            (Some(earliest), Some(latest)) => {
                let delta_kg = latest - earliest;
                Self {
                    delta_kg,
                    label: TrendLabel::from_delta(delta_kg),
                }
            }
            _ => Self::flat(),
        }
    }
}

/// Weight trend, flagging a missing history when none was supplied
pub fn assess_weight_trend(weights: Option<&HistoricalWeights>) -> Assessed<WeightTrend> {
    match weights {
        Some(series) if !series.is_empty() => Assessed::clean(WeightTrend::from_series(series)),
        _ => Assessed::flagged(WeightTrend::flat(), RiskFlag::WeightHistoryMissing),
    }
}

/// Summary statistics for the day's CGM readings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlucoseStats {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl GlucoseStats {
    /// Compute stats from the band's CGM readings; `None` without readings
    pub fn from_band(band: &BandSignalBundle) -> Option<Self> {
        if band.cgm.is_empty() {
            return None;
        }

        let n = band.cgm.len() as f64;
        let mean = band.cgm_values().sum::<f64>() / n;
        let variance = band.cgm_values().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Elevated mean together with elevated variability
    pub fn insulin_sensitivity(&self) -> InsulinSensitivity {
        if self.mean > GLUCOSE_MEAN_THRESHOLD && self.std_dev > GLUCOSE_VARIABILITY_THRESHOLD {
            InsulinSensitivity::Monitor
        } else {
            InsulinSensitivity::Stable
        }
    }
}

/// Insulin sensitivity flag; stable when there is no CGM data
pub fn insulin_sensitivity(stats: Option<&GlucoseStats>) -> InsulinSensitivity {
    stats
        .map(GlucoseStats::insulin_sensitivity)
        .unwrap_or(InsulinSensitivity::Stable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Reading;

    fn weights(entries: &[(&str, f64)]) -> HistoricalWeights {
        entries
            .iter()
            .map(|(date, kg)| (date.to_string(), *kg))
            .collect()
    }

    fn cgm(values: &[f64]) -> BandSignalBundle {
        BandSignalBundle {
            cgm: values.iter().map(|&value| Reading { value }).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_trend_sorts_by_date() {
        let series = weights(&[("2024-01-14", 79.2), ("2024-01-01", 80.0), ("2024-01-07", 79.9)]);
        let trend = WeightTrend::from_series(&series);
        assert!((trend.delta_kg + 0.8).abs() < 1e-9);
        assert_eq!(trend.label, TrendLabel::Deficit);
    }

    #[test]
    fn test_trend_surplus_and_balance() {
        let up = WeightTrend::from_series(&weights(&[("2024-01-01", 70.0), ("2024-01-14", 70.6)]));
        assert_eq!(up.label, TrendLabel::Surplus);

        let level = WeightTrend::from_series(&weights(&[("2024-01-01", 70.0), ("2024-01-14", 70.0)]));
        assert_eq!(level.label, TrendLabel::Balance);
        assert_eq!(level.delta_kg, 0.0);
    }

    #[test]
    fn test_single_entry_is_flat() {
        let assessed = assess_weight_trend(Some(&weights(&[("2024-01-15", 72.0)])));
        assert_eq!(assessed.value, WeightTrend::flat());
        assert!(assessed.flags.is_empty());
    }

    #[test]
    fn test_missing_history_is_flagged() {
        let assessed = assess_weight_trend(None);
        assert_eq!(assessed.value, WeightTrend::flat());
        assert_eq!(assessed.flags, vec![RiskFlag::WeightHistoryMissing]);

        let empty = HistoricalWeights::new();
        assert_eq!(
            assess_weight_trend(Some(&empty)).flags,
            vec![RiskFlag::WeightHistoryMissing]
        );
    }

    #[test]
    fn test_glucose_stats() {
        let stats = GlucoseStats::from_band(&cgm(&[90.0, 130.0])).unwrap();
        assert!((stats.mean - 110.0).abs() < 1e-9);
        assert!((stats.std_dev - 20.0).abs() < 1e-9);
        assert!(GlucoseStats::from_band(&BandSignalBundle::default()).is_none());
    }

    #[test]
    fn test_insulin_flag_requires_both_thresholds() {
        let volatile = GlucoseStats::from_band(&cgm(&[90.0, 130.0]));
        assert_eq!(insulin_sensitivity(volatile.as_ref()), InsulinSensitivity::Monitor);

        let steady = GlucoseStats::from_band(&cgm(&[100.0, 120.0]));
        assert_eq!(insulin_sensitivity(steady.as_ref()), InsulinSensitivity::Stable);

        let low_mean = GlucoseStats {
            mean: 95.0,
            std_dev: 30.0,
        };
        assert_eq!(low_mean.insulin_sensitivity(), InsulinSensitivity::Stable);

        assert_eq!(insulin_sensitivity(None), InsulinSensitivity::Stable);
    }
}
