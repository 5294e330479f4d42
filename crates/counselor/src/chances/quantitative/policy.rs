use serde::{Deserialize, Serialize};

use super::rules::known_acceptance_rate;
use crate::chances::domain::Confidence;
use crate::chances::school::SchoolData;
use crate::chances::snapshot::ProfileSnapshot;

/// Multiple of the admit rate the blended probability may not exceed.
pub const CEILING_RATE_MULTIPLIER: f64 = 2.5;
/// Absolute ceiling whenever the acceptance rate is known.
pub const CEILING_MAX: f64 = 80.0;

/// Upper bound on the probability at a school, when its acceptance rate is known.
pub fn selectivity_ceiling(school: &SchoolData) -> Option<f64> {
    known_acceptance_rate(school).map(|rate| (rate * 100.0 * CEILING_RATE_MULTIPLIER).min(CEILING_MAX))
}

/// Inputs whose absence lowers confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingInput {
    Gpa,
    TestScores,
    AcceptanceRate,
    SchoolTestRanges,
}

impl MissingInput {
    pub const fn label(self) -> &'static str {
        match self {
            MissingInput::Gpa => "GPA",
            MissingInput::TestScores => "test scores",
            MissingInput::AcceptanceRate => "school acceptance rate",
            MissingInput::SchoolTestRanges => "school test score ranges",
        }
    }
}

pub(crate) fn missing_inputs(snapshot: &ProfileSnapshot, school: &SchoolData) -> Vec<MissingInput> {
    let mut missing = Vec::new();
    if snapshot.academics.normalized_gpa().is_none() {
        missing.push(MissingInput::Gpa);
    }
    if !snapshot.testing.has_admission_test() {
        missing.push(MissingInput::TestScores);
    }
    if known_acceptance_rate(school).is_none() {
        missing.push(MissingInput::AcceptanceRate);
    }
    if !school.has_test_ranges() {
        missing.push(MissingInput::SchoolTestRanges);
    }
    missing
}

/// 0 gaps is high, 1-2 medium, 3 or more low.
pub(crate) fn decide_confidence(missing: &[MissingInput]) -> (Confidence, String) {
    let confidence = match missing.len() {
        0 => Confidence::High,
        1 | 2 => Confidence::Medium,
        _ => Confidence::Low,
    };

    let reason = if missing.is_empty() {
        "Based on complete academic, testing, and school admissions data".to_string()
    } else {
        let labels: Vec<&str> = missing.iter().map(|item| item.label()).collect();
        format!("Missing {}", labels.join(", "))
    };

    (confidence, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_degrades_with_missing_inputs() {
        assert_eq!(decide_confidence(&[]).0, Confidence::High);
        assert_eq!(decide_confidence(&[MissingInput::Gpa]).0, Confidence::Medium);
        assert_eq!(
            decide_confidence(&[MissingInput::Gpa, MissingInput::TestScores]).0,
            Confidence::Medium
        );

        let (confidence, reason) = decide_confidence(&[
            MissingInput::Gpa,
            MissingInput::TestScores,
            MissingInput::AcceptanceRate,
        ]);
        assert_eq!(confidence, Confidence::Low);
        assert_eq!(reason, "Missing GPA, test scores, school acceptance rate");
    }
}
