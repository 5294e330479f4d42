//! Secondary path: a fast-model pass over the qualitative factors that nudges the
//! quantitative baseline by at most twenty points.
//!
//! [`LegacyRefiner::refine`] never fails. Transport and parse errors degrade to the
//! quantitative baseline with low confidence.

mod parse;
mod prompt;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use super::domain::{
    clamp_probability, AssessmentMethod, ChancesResult, Confidence, FactorAssessment, FactorSet,
    Impact, Improvement, ImprovementPriority, Mode, Tier,
};
use super::llm::{CompletionClient, ModelRoute};
use super::quantitative::QuantitativeResult;
use super::school::ExtendedSchoolData;
use super::snapshot::ProfileSnapshot;
use parse::{clamp_adjustment, parse_refinement, RefinedFactor, Refinement};

pub(crate) const FALLBACK_REASON: &str =
    "Qualitative review unavailable; estimate is based on academic and testing data only";

pub struct LegacyRefiner {
    client: Arc<dyn CompletionClient>,
}

impl LegacyRefiner {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    #[instrument(
        skip_all,
        fields(profile_id = %snapshot.id, school_id = %school.stats.id, mode = mode.label())
    )]
    pub async fn refine(
        &self,
        snapshot: &ProfileSnapshot,
        school: &ExtendedSchoolData,
        quantitative: &QuantitativeResult,
        mode: Mode,
    ) -> ChancesResult {
        let prompt = prompt::build_prompt(snapshot, school, quantitative, mode);
        let raw = match self
            .client
            .complete(ModelRoute::Fast, prompt::SYSTEM_PROMPT, &prompt)
            .await
        {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "refinement call failed; using quantitative baseline");
                return fallback(quantitative, mode);
            }
        };

        match parse_refinement(&raw) {
            Ok(refinement) => refined(quantitative, refinement, mode),
            Err(err) => {
                warn!(error = %err, "refinement output unusable; using quantitative baseline");
                fallback(quantitative, mode)
            }
        }
    }
}

fn factor_from(raw: RefinedFactor, name: &str) -> FactorAssessment {
    let score = if raw.score.is_finite() {
        raw.score.round().clamp(0.0, 100.0) as u8
    } else {
        FactorAssessment::NEUTRAL_SCORE
    };
    let explanation = if raw.explanation.trim().is_empty() {
        format!("{name} reviewed")
    } else {
        raw.explanation.trim().to_string()
    };
    FactorAssessment {
        score,
        impact: raw.impact.unwrap_or_else(|| Impact::from_score(score)),
        explanation,
    }
}

fn refined(quantitative: &QuantitativeResult, refinement: Refinement, mode: Mode) -> ChancesResult {
    let adjustment = clamp_adjustment(refinement.adjustment);
    let probability = clamp_probability(f64::from(quantitative.base_probability) + adjustment);
    debug!(
        base = quantitative.base_probability,
        adjustment, probability, "refinement applied"
    );

    let improvements = refinement
        .improvements
        .into_iter()
        .filter(|item| !item.action.trim().is_empty())
        .enumerate()
        .map(|(index, item)| Improvement {
            rank: u8::try_from(index + 1).unwrap_or(u8::MAX),
            action: item.action.trim().to_string(),
            priority: item.priority.unwrap_or(ImprovementPriority::Medium),
            category: item.category,
        })
        .collect();

    let summary = match refinement.summary.trim() {
        "" => format!(
            "Estimated {probability}% based on academics, testing, and activities."
        ),
        text => text.to_string(),
    };

    ChancesResult {
        probability,
        tier: Tier::from_probability(probability),
        mode,
        factors: FactorSet {
            academics: quantitative.factors.academics.clone(),
            testing: quantitative.factors.testing.clone(),
            activities: factor_from(refinement.factors.activities, "Activities"),
            awards: factor_from(refinement.factors.awards, "Awards"),
        },
        summary,
        improvements: Improvement::rank_all(improvements),
        confidence: quantitative.confidence,
        confidence_reason: quantitative.confidence_reason.clone(),
        method: AssessmentMethod::Refined,
        calculated_at: Utc::now(),
    }
}

/// Degraded result built from the baseline alone.
pub(crate) fn fallback(quantitative: &QuantitativeResult, mode: Mode) -> ChancesResult {
    let probability = quantitative.base_probability;
    ChancesResult {
        probability,
        tier: Tier::from_probability(probability),
        mode,
        factors: FactorSet {
            academics: quantitative.factors.academics.clone(),
            testing: quantitative.factors.testing.clone(),
            activities: FactorAssessment::neutral("Activities were not assessed"),
            awards: FactorAssessment::neutral("Awards were not assessed"),
        },
        summary: format!(
            "Statistical estimate of {probability}% from academics, testing, and the school's \
             acceptance rate."
        ),
        improvements: Vec::new(),
        confidence: Confidence::Low,
        confidence_reason: FALLBACK_REASON.to_string(),
        method: AssessmentMethod::QuantitativeFallback,
        calculated_at: Utc::now(),
    }
}
