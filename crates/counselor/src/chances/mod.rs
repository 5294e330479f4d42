//! Admission chances estimation.
//!
//! A request flows through the snapshot builder, then either the holistic assessor (primary,
//! fails loudly) or the quantitative scorer plus legacy refiner (secondary, degrades quietly).
//! [`ChancesService`] composes the pieces with the profile, school, and usage stores.

pub mod domain;
pub mod gate;
pub mod holistic;
pub mod legacy;
pub mod llm;
pub mod quantitative;
pub mod repository;
pub mod router;
pub mod school;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use domain::{
    probability_from_decimal, probability_to_decimal, AssessmentMethod, ChancesResult,
    Confidence, FactorAssessment, FactorSet, Impact, Improvement, ImprovementPriority, Mode,
    Tier, MAX_PROBABILITY, MIN_PROBABILITY,
};
pub use gate::{SubscriptionTier, UsageLimitExceeded, UsageLimits};
pub use holistic::{AssessmentError, HolisticAssessor};
pub use legacy::LegacyRefiner;
pub use llm::{CompletionClient, HttpCompletionClient, LlmError, ModelRoute};
pub use quantitative::{act_to_sat, calculate_quantitative, QuantitativeFactors, QuantitativeResult};
pub use repository::{ProfileRepository, RepositoryError, SchoolRepository, UsageLedger};
pub use router::chances_router;
pub use school::{ExtendedSchoolData, SchoolData, SchoolId, SelectivityTier};
pub use service::{ChancesService, ChancesServiceError, BATCH_CONCURRENCY};
pub use snapshot::{
    build_snapshot, ItemStatus, ProfileId, ProfileRecord, ProfileSnapshot, SchoolListId,
    SnapshotBuilder, SnapshotOptions,
};
