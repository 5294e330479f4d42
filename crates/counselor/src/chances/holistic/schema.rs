use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::AssessmentError;
use crate::chances::domain::{
    clamp_probability, AssessmentMethod, ChancesResult, Confidence, FactorAssessment, FactorSet,
    Impact, Improvement, ImprovementPriority, Mode, Tier, MAX_PROBABILITY, MIN_PROBABILITY,
};
use crate::chances::llm::StructuredSchema;

fn factor_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "score": { "type": "number", "minimum": 0, "maximum": 100 },
            "impact": {
                "type": "string",
                "enum": ["strong_positive", "positive", "neutral", "negative", "strong_negative"]
            },
            "explanation": { "type": "string" }
        },
        "required": ["score", "impact", "explanation"],
        "additionalProperties": false
    })
}

/// Contract for the holistic assessment response.
pub(crate) fn holistic_schema() -> StructuredSchema {
    let tiers: Vec<&str> = Tier::ALL.iter().map(|tier| tier.label()).collect();
    StructuredSchema {
        name: "admission_chances",
        schema: json!({
            "type": "object",
            "properties": {
                "probability": {
                    "type": "number",
                    "minimum": MIN_PROBABILITY,
                    "maximum": MAX_PROBABILITY
                },
                "tier": { "type": "string", "enum": tiers },
                "factors": {
                    "type": "object",
                    "properties": {
                        "academics": factor_schema(),
                        "testing": factor_schema(),
                        "activities": factor_schema(),
                        "awards": factor_schema()
                    },
                    "required": ["academics", "testing", "activities", "awards"],
                    "additionalProperties": false
                },
                "summary": { "type": "string" },
                "improvements": {
                    "type": "array",
                    "maxItems": Improvement::MAX_SUGGESTIONS,
                    "items": {
                        "type": "object",
                        "properties": {
                            "action": { "type": "string" },
                            "priority": { "type": "string", "enum": ["high", "medium", "low"] },
                            "category": { "type": "string" }
                        },
                        "required": ["action", "priority", "category"],
                        "additionalProperties": false
                    }
                },
                "confidence": { "type": "string", "enum": ["high", "medium", "low"] },
                "confidenceReason": { "type": "string" }
            },
            "required": [
                "probability", "tier", "factors", "summary",
                "improvements", "confidence", "confidenceReason"
            ],
            "additionalProperties": false
        }),
    }
}

#[derive(Debug, Deserialize)]
struct RawFactor {
    score: f64,
    impact: Impact,
    explanation: String,
}

impl RawFactor {
    fn validated(self, name: &str) -> Result<FactorAssessment, AssessmentError> {
        if !self.score.is_finite() {
            return Err(AssessmentError::InvalidResponse(format!(
                "{name} score is not a number"
            )));
        }
        Ok(FactorAssessment {
            score: self.score.round().clamp(0.0, 100.0) as u8,
            impact: self.impact,
            explanation: self.explanation.trim().to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawFactors {
    academics: RawFactor,
    testing: RawFactor,
    activities: RawFactor,
    awards: RawFactor,
}

#[derive(Debug, Deserialize)]
struct RawImprovement {
    action: String,
    priority: ImprovementPriority,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAssessment {
    probability: f64,
    tier: Tier,
    factors: RawFactors,
    summary: String,
    #[serde(default)]
    improvements: Vec<RawImprovement>,
    confidence: Confidence,
    confidence_reason: String,
}

/// Check the model output against the contract bounds and build the result.
///
/// The probability is clamped into `1..=95`, the tier is re-derived from it, factor scores are
/// clamped to `0..=100`, and improvements are capped at five in the order the model ranked them.
pub(crate) fn validate(
    raw: Value,
    mode: Mode,
    calculated_at: DateTime<Utc>,
) -> Result<ChancesResult, AssessmentError> {
    let parsed: RawAssessment = serde_json::from_value(raw)
        .map_err(|err| AssessmentError::InvalidResponse(err.to_string()))?;

    if !parsed.probability.is_finite() {
        return Err(AssessmentError::InvalidResponse(
            "probability is not a number".to_string(),
        ));
    }
    let summary = parsed.summary.trim().to_string();
    if summary.is_empty() {
        return Err(AssessmentError::InvalidResponse(
            "summary is empty".to_string(),
        ));
    }

    let probability = clamp_probability(parsed.probability);
    let tier = Tier::from_probability(probability);
    if tier != parsed.tier {
        debug!(
            probability,
            reported = parsed.tier.label(),
            derived = tier.label(),
            "model tier disagrees with probability; using derived tier"
        );
    }

    let factors = FactorSet {
        academics: parsed.factors.academics.validated("academics")?,
        testing: parsed.factors.testing.validated("testing")?,
        activities: parsed.factors.activities.validated("activities")?,
        awards: parsed.factors.awards.validated("awards")?,
    };

    let improvements = parsed
        .improvements
        .into_iter()
        .filter(|item| !item.action.trim().is_empty())
        .enumerate()
        .map(|(index, item)| Improvement {
            rank: u8::try_from(index + 1).unwrap_or(u8::MAX),
            action: item.action.trim().to_string(),
            priority: item.priority,
            category: item.category.filter(|category| !category.trim().is_empty()),
        })
        .collect();

    Ok(ChancesResult {
        probability,
        tier,
        mode,
        factors,
        summary,
        improvements: Improvement::rank_all(improvements),
        confidence: parsed.confidence,
        confidence_reason: parsed.confidence_reason.trim().to_string(),
        method: AssessmentMethod::Holistic,
        calculated_at,
    })
}
