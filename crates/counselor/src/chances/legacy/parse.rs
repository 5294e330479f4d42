use serde::Deserialize;

use crate::chances::domain::{Impact, ImprovementPriority};

pub(crate) const MAX_ADJUSTMENT: f64 = 20.0;

#[derive(Debug, Deserialize)]
pub(crate) struct RefinedFactor {
    pub score: f64,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefinedImprovement {
    pub action: String,
    #[serde(default)]
    pub priority: Option<ImprovementPriority>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefinedFactors {
    pub activities: RefinedFactor,
    pub awards: RefinedFactor,
}

/// Shape the fast model is asked to return.
#[derive(Debug, Deserialize)]
pub(crate) struct Refinement {
    pub factors: RefinedFactors,
    pub adjustment: f64,
    pub summary: String,
    #[serde(default)]
    pub improvements: Vec<RefinedImprovement>,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ParseError {
    #[error("no JSON object found in completion")]
    NoObject,
    #[error("completion JSON did not match the refinement shape: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("adjustment is not a number")]
    InvalidAdjustment,
}

/// Extract the JSON object from raw output that may be wrapped in code fences or prose.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

pub(crate) fn parse_refinement(raw: &str) -> Result<Refinement, ParseError> {
    let json = extract_json_object(raw).ok_or(ParseError::NoObject)?;
    let refinement: Refinement = serde_json::from_str(json)?;
    if !refinement.adjustment.is_finite() {
        return Err(ParseError::InvalidAdjustment);
    }
    Ok(refinement)
}

pub(crate) fn clamp_adjustment(adjustment: f64) -> f64 {
    adjustment.clamp(-MAX_ADJUSTMENT, MAX_ADJUSTMENT)
}
