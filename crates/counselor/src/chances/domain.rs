use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::snapshot::{GoalStatus, ItemStatus};

/// Lowest probability any assessment may report.
pub const MIN_PROBABILITY: u8 = 1;
/// Highest probability any assessment may report; certainty is never claimed.
pub const MAX_PROBABILITY: u8 = 95;

/// Round and clamp a raw probability into the reportable `1..=95` range.
pub fn clamp_probability(raw: f64) -> u8 {
    if !raw.is_finite() {
        return MIN_PROBABILITY;
    }
    raw.round()
        .clamp(f64::from(MIN_PROBABILITY), f64::from(MAX_PROBABILITY)) as u8
}

/// Decimal form stored on a school-list row (`42` -> `0.42`).
pub fn probability_to_decimal(probability: u8) -> f64 {
    f64::from(probability) / 100.0
}

/// Recover the integer probability from a cached decimal.
pub fn probability_from_decimal(value: f64) -> Option<u8> {
    if !value.is_finite() {
        return None;
    }
    Some((value * 100.0).round().clamp(0.0, 100.0) as u8)
}

/// Ordinal admission outlook, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Unlikely,
    Reach,
    Target,
    Likely,
    Safety,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Unlikely,
        Tier::Reach,
        Tier::Target,
        Tier::Likely,
        Tier::Safety,
    ];

    /// Exclusive upper bounds for every tier except `Safety`.
    const BREAKPOINTS: [(u8, Tier); 4] = [
        (15, Tier::Unlikely),
        (30, Tier::Reach),
        (50, Tier::Target),
        (70, Tier::Likely),
    ];

    /// The only mapping from probability to tier. Every assessment path goes through here.
    pub fn from_probability(probability: u8) -> Tier {
        Self::BREAKPOINTS
            .iter()
            .find(|(upper, _)| probability < *upper)
            .map(|(_, tier)| *tier)
            .unwrap_or(Tier::Safety)
    }

    /// Inclusive probability range covered by the tier, used for prompt guidelines.
    pub fn probability_range(self) -> (u8, u8) {
        let mut lower = MIN_PROBABILITY;
        for (upper, tier) in Self::BREAKPOINTS {
            if tier == self {
                return (lower, upper - 1);
            }
            lower = upper;
        }
        (lower, MAX_PROBABILITY)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Tier::Unlikely => "unlikely",
            Tier::Reach => "reach",
            Tier::Target => "target",
            Tier::Likely => "likely",
            Tier::Safety => "safety",
        }
    }

    pub fn parse(value: &str) -> Option<Tier> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.label().eq_ignore_ascii_case(value.trim()))
    }
}

/// Which achievements feed an assessment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Completed, verifiable achievements only.
    #[default]
    Current,
    /// Adds in-progress work and goals as trajectory.
    Projected,
    /// Adds planning-stage items and goals as hypotheticals.
    Simulated,
}

impl Mode {
    pub const fn label(self) -> &'static str {
        match self {
            Mode::Current => "current",
            Mode::Projected => "projected",
            Mode::Simulated => "simulated",
        }
    }

    pub fn includes(self, status: ItemStatus) -> bool {
        match (self, status) {
            (_, ItemStatus::Actual) => true,
            (Mode::Projected | Mode::Simulated, ItemStatus::InProgress) => true,
            (Mode::Simulated, ItemStatus::Planning) => true,
            _ => false,
        }
    }

    pub fn includes_goal(self, status: GoalStatus) -> bool {
        match (self, status) {
            (Mode::Current, _) => false,
            (_, GoalStatus::InProgress) => true,
            (Mode::Simulated, GoalStatus::Planning) => true,
            _ => false,
        }
    }
}

/// Qualitative direction of a factor's effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    StrongPositive,
    Positive,
    Neutral,
    Negative,
    StrongNegative,
}

impl Impact {
    pub fn from_score(score: u8) -> Impact {
        match score {
            85..=u8::MAX => Impact::StrongPositive,
            65..=84 => Impact::Positive,
            45..=64 => Impact::Neutral,
            30..=44 => Impact::Negative,
            _ => Impact::StrongNegative,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Impact::StrongPositive => "strong_positive",
            Impact::Positive => "positive",
            Impact::Neutral => "neutral",
            Impact::Negative => "negative",
            Impact::StrongNegative => "strong_negative",
        }
    }
}

/// One scored factor with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorAssessment {
    pub score: u8,
    pub impact: Impact,
    pub explanation: String,
}

impl FactorAssessment {
    pub const NEUTRAL_SCORE: u8 = 50;

    pub fn scored(score: u8, explanation: impl Into<String>) -> Self {
        let score = score.min(100);
        Self {
            score,
            impact: Impact::from_score(score),
            explanation: explanation.into(),
        }
    }

    pub fn neutral(explanation: impl Into<String>) -> Self {
        Self {
            score: Self::NEUTRAL_SCORE,
            impact: Impact::Neutral,
            explanation: explanation.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSet {
    pub academics: FactorAssessment,
    pub testing: FactorAssessment,
    pub activities: FactorAssessment,
    pub awards: FactorAssessment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementPriority {
    High,
    Medium,
    Low,
}

impl ImprovementPriority {
    pub const fn label(self) -> &'static str {
        match self {
            ImprovementPriority::High => "high",
            ImprovementPriority::Medium => "medium",
            ImprovementPriority::Low => "low",
        }
    }
}

/// Ranked suggestion; rank 1 is the most valuable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Improvement {
    pub rank: u8,
    pub action: String,
    pub priority: ImprovementPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Improvement {
    pub const MAX_SUGGESTIONS: usize = 5;

    /// Cap the list and renumber ranks so they are contiguous from 1.
    pub fn rank_all(mut items: Vec<Improvement>) -> Vec<Improvement> {
        items.sort_by_key(|item| item.rank);
        items.truncate(Self::MAX_SUGGESTIONS);
        for (index, item) in items.iter_mut().enumerate() {
            item.rank = index as u8 + 1;
        }
        items
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub const fn label(self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// How a result was produced, so callers can flag degraded estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentMethod {
    Holistic,
    Refined,
    QuantitativeFallback,
}

/// Output contract for every assessment path. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChancesResult {
    pub probability: u8,
    pub tier: Tier,
    pub mode: Mode,
    pub factors: FactorSet,
    pub summary: String,
    pub improvements: Vec<Improvement>,
    pub confidence: Confidence,
    pub confidence_reason: String,
    pub method: AssessmentMethod,
    pub calculated_at: DateTime<Utc>,
}

impl ChancesResult {
    /// Value written to the school-list cache.
    pub fn cached_decimal(&self) -> f64 {
        probability_to_decimal(self.probability)
    }

    pub fn is_degraded(&self) -> bool {
        self.method == AssessmentMethod::QuantitativeFallback
    }
}
