//! Deterministic scorer blending academics, testing, and the school's admit rate.
//!
//! [`calculate_quantitative`] has no I/O and no failure mode. Missing inputs produce neutral
//! factor scores and lower confidence instead of errors.

mod conversion;
mod policy;
mod rules;

pub use conversion::act_to_sat;
pub use policy::{selectivity_ceiling, MissingInput, CEILING_MAX, CEILING_RATE_MULTIPLIER};

use serde::{Deserialize, Serialize};

use super::domain::{clamp_probability, Confidence, FactorAssessment, Tier};
use super::school::SchoolData;
use super::snapshot::ProfileSnapshot;
use policy::{decide_confidence, missing_inputs};

pub const WEIGHT_ACADEMICS: f64 = 0.35;
pub const WEIGHT_TESTING: f64 = 0.35;
pub const WEIGHT_ACCEPTANCE_RATE: f64 = 0.30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitativeFactors {
    pub academics: FactorAssessment,
    pub testing: FactorAssessment,
    pub acceptance_rate: FactorAssessment,
}

/// Output of the quantitative scorer; also the baseline handed to both LLM paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitativeResult {
    pub base_probability: u8,
    pub tier: Tier,
    /// Weighted blend before the selectivity ceiling.
    pub weighted_score: f64,
    pub ceiling: Option<f64>,
    pub factors: QuantitativeFactors,
    pub confidence: Confidence,
    pub confidence_reason: String,
    pub missing: Vec<MissingInput>,
}

pub fn calculate_quantitative(snapshot: &ProfileSnapshot, school: &SchoolData) -> QuantitativeResult {
    let factors = QuantitativeFactors {
        academics: rules::academics_factor(snapshot, school),
        testing: rules::testing_factor(snapshot, school),
        acceptance_rate: rules::acceptance_rate_factor(school),
    };

    let weighted_score = f64::from(factors.academics.score) * WEIGHT_ACADEMICS
        + f64::from(factors.testing.score) * WEIGHT_TESTING
        + f64::from(factors.acceptance_rate.score) * WEIGHT_ACCEPTANCE_RATE;

    let ceiling = selectivity_ceiling(school);
    let capped = match ceiling {
        Some(ceiling) => weighted_score.min(ceiling),
        None => weighted_score,
    };
    let base_probability = clamp_probability(capped);

    let missing = missing_inputs(snapshot, school);
    let (confidence, confidence_reason) = decide_confidence(&missing);

    QuantitativeResult {
        base_probability,
        tier: Tier::from_probability(base_probability),
        weighted_score,
        ceiling,
        factors,
        confidence,
        confidence_reason,
        missing,
    }
}
