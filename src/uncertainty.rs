//! Uncertainty propagation and confidence scoring
//!
//! Missing inputs are never errors here. Each stage returns an [`Assessed`]
//! value carrying the risk flags raised while defaulting, and the flags drive
//! the confidence scores. The scores are fixed heuristics, not learned.

use crate::constants::{calculate_confidence, propagate_uncertainty};
use crate::expenditure::ExpenditureBreakdown;
use crate::types::RiskFlag;

const EXPENDITURE_CONFIDENCE_COMPLETE: f64 = 0.85;
const EXPENDITURE_CONFIDENCE_FLAGGED: f64 = 0.75;
const BODY_CONFIDENCE_WITH_WEIGHT: f64 = 0.90;
const BODY_CONFIDENCE_WITHOUT_WEIGHT: f64 = 0.70;

/// A computed value together with the caveats raised while producing it
#[derive(Debug, Clone, PartialEq)]
pub struct Assessed<T> {
    pub value: T,
    pub flags: Vec<RiskFlag>,
}

impl<T> Assessed<T> {
    /// A value produced from complete data
    pub fn clean(value: T) -> Self {
        Self {
            value,
            flags: Vec::new(),
        }
    }

    /// A value that had to fall back to a default
    pub fn flagged(value: T, flag: RiskFlag) -> Self {
        Self {
            value,
            flags: vec![flag],
        }
    }

    /// Move this value's flags into `flags`, returning the value
    pub fn drain_into(self, flags: &mut Vec<RiskFlag>) -> T {
        flags.extend(self.flags);
        self.value
    }
}

/// Energy balance interval (kcal)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceBand {
    pub low: f64,
    pub high: f64,
}

impl ConfidenceBand {
    /// Build the band around an energy balance estimate.
    ///
    /// Both uncertainty magnitudes are added to both bounds, so the band is
    /// symmetric and always contains the estimate, whatever the signs passed in.
    pub fn around(energy_balance: f64, epsilon_in: f64, epsilon_out: f64) -> Self {
        let half_width = epsilon_in.abs() + epsilon_out.abs();
        Self {
            low: energy_balance - half_width,
            high: energy_balance + half_width,
        }
    }

    /// Propagate component uncertainty and build the band in one step
    pub fn from_components(
        energy_balance: f64,
        expenditure: &ExpenditureBreakdown,
        adjusted_intake_kcal: f64,
    ) -> Self {
        let (epsilon_in, epsilon_out) = propagate_uncertainty(
            expenditure.rmr,
            expenditure.aee,
            expenditure.tef,
            adjusted_intake_kcal,
        );
        Self::around(energy_balance, epsilon_in, epsilon_out)
    }
}

/// Per-section confidence scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceScores {
    pub intake: f64,
    pub expenditure: f64,
    pub body: f64,
}

impl ConfidenceScores {
    /// Score the day from its risk flags and whether any weight was supplied
    pub fn from_flags(flags: &[RiskFlag], has_weight_data: bool) -> Self {
        let expenditure = if flags.is_empty() {
            EXPENDITURE_CONFIDENCE_COMPLETE
        } else {
            EXPENDITURE_CONFIDENCE_FLAGGED
        };
        let body = if has_weight_data {
            BODY_CONFIDENCE_WITH_WEIGHT
        } else {
            BODY_CONFIDENCE_WITHOUT_WEIGHT
        };

        Self {
            intake: calculate_confidence(flags),
            expenditure,
            body,
        }
    }
}
