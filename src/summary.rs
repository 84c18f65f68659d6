//! Dashboard summary
//!
//! Reshapes a daily report into the compact view the client dashboard renders:
//! today's intake and burn, macro progress against goals, and an hourly flow.

use crate::types::{DailyEnergyBalanceReport, MacroGoal, MacroGoals};
use serde::{Deserialize, Serialize};

const DEFAULT_PROTEIN_GOAL: MacroGoal = MacroGoal {
    goal: 140.0,
    target: 117.0,
};
const DEFAULT_CARBS_GOAL: MacroGoal = MacroGoal {
    goal: 75.0,
    target: 50.0,
};
const DEFAULT_FATS_GOAL: MacroGoal = MacroGoal {
    goal: 52.0,
    target: 40.0,
};

/// Hours covered by the daily flow, inclusive of both midnights
const FLOW_HOURS: u32 = 24;

/// Intake and burn figures for today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayMetrics {
    pub current_intake: i64,
    pub current_burn: i64,
    pub projected_intake: i64,
    pub projected_burn: i64,
    pub current_deficit: i64,
    pub projected_deficit: i64,
}

/// Goal and target per macro
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroTargets {
    pub protein: MacroGoal,
    pub carbs: MacroGoal,
    pub fats: MacroGoal,
}

/// Logged grams per macro
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroIntake {
    pub protein: i64,
    pub carbs: i64,
    pub fats: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroProgress {
    pub target: MacroTargets,
    pub intake: MacroIntake,
}

/// One hour of the daily flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPoint {
    pub hour: u32,
    pub intake: i64,
    pub burn: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyFlow {
    pub data: Vec<FlowPoint>,
}

/// Dashboard view of a daily report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub today_metrics: TodayMetrics,
    pub macros: MacroProgress,
    pub daily_flow: DailyFlow,
}

impl DashboardSummary {
    /// Build the summary from a report and the profile's optional macro goals
    pub fn from_report(report: &DailyEnergyBalanceReport, goals: Option<&MacroGoals>) -> Self {
        let intake = &report.intake;
        let tee = report.expenditure.tee_kcal;

        let today_metrics = TodayMetrics {
            current_intake: intake.logged_kcal,
            current_burn: tee,
            projected_intake: intake.bias_adjusted_kcal,
            projected_burn: tee,
            current_deficit: intake.logged_kcal - tee,
            projected_deficit: intake.bias_adjusted_kcal - tee,
        };

        let target = MacroTargets {
            protein: goals.and_then(|g| g.protein).unwrap_or(DEFAULT_PROTEIN_GOAL),
            carbs: goals.and_then(|g| g.carbs).unwrap_or(DEFAULT_CARBS_GOAL),
            fats: goals.and_then(|g| g.fat).unwrap_or(DEFAULT_FATS_GOAL),
        };

        let macros = MacroProgress {
            target,
            intake: MacroIntake {
                protein: intake.macros.protein_g,
                carbs: intake.macros.carbs_g,
                fats: intake.macros.fat_g,
            },
        };

        // No meal timing is available, so intake is flat and burn is resting rate spread evenly
        let hourly_burn = (report.expenditure.rmr_kcal as f64 / f64::from(FLOW_HOURS)).round() as i64;
        let daily_flow = DailyFlow {
            data: (0..=FLOW_HOURS)
                .map(|hour| FlowPoint {
                    hour,
                    intake: 0,
                    burn: hourly_burn,
                })
                .collect(),
        };

        Self {
            today_metrics,
            macros,
            daily_flow,
        }
    }
}
