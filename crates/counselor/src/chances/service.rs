use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{debug, info, instrument, warn};

use super::domain::{ChancesResult, Mode};
use super::gate::{SubscriptionTier, UsageLimitExceeded, UsageLimits};
use super::holistic::{AssessmentError, HolisticAssessor};
use super::legacy::LegacyRefiner;
use super::llm::CompletionClient;
use super::quantitative::calculate_quantitative;
use super::repository::{ProfileRepository, RepositoryError, SchoolRepository, UsageLedger};
use super::school::{ExtendedSchoolData, SchoolId};
use super::snapshot::{ProfileId, ProfileSnapshot, SnapshotBuilder, SnapshotOptions};

/// Schools assessed at the same time by [`ChancesService::assess_many`].
pub const BATCH_CONCURRENCY: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssessmentPath {
    Holistic,
    Refined,
}

/// Service composing the snapshot builder, usage gate, and both assessment paths.
pub struct ChancesService<P, S, U> {
    profiles: Arc<P>,
    schools: Arc<S>,
    usage: Arc<U>,
    snapshots: SnapshotBuilder<P>,
    holistic: HolisticAssessor,
    refiner: LegacyRefiner,
    limits: UsageLimits,
}

impl<P, S, U> ChancesService<P, S, U>
where
    P: ProfileRepository + 'static,
    S: SchoolRepository + 'static,
    U: UsageLedger + 'static,
{
    pub fn new(
        profiles: Arc<P>,
        schools: Arc<S>,
        usage: Arc<U>,
        client: Arc<dyn CompletionClient>,
        limits: UsageLimits,
    ) -> Self {
        Self {
            snapshots: SnapshotBuilder::new(profiles.clone()),
            profiles,
            schools,
            usage,
            holistic: HolisticAssessor::new(client.clone()),
            refiner: LegacyRefiner::new(client),
            limits,
        }
    }

    /// Holistic assessment for one school. LLM failures are returned, never masked.
    #[instrument(
        skip_all,
        fields(profile_id = %profile_id, school_id = %school_id, mode = mode.label())
    )]
    pub async fn assess(
        &self,
        profile_id: &ProfileId,
        school_id: &SchoolId,
        mode: Mode,
        persist: bool,
    ) -> Result<ChancesResult, ChancesServiceError> {
        let snapshot = self.snapshot(profile_id)?;
        self.assess_loaded(&snapshot, school_id, mode, persist, AssessmentPath::Holistic)
            .await
    }

    /// Quantitative score refined by the fast model; degrades instead of failing on LLM errors.
    #[instrument(
        skip_all,
        fields(profile_id = %profile_id, school_id = %school_id, mode = mode.label())
    )]
    pub async fn estimate(
        &self,
        profile_id: &ProfileId,
        school_id: &SchoolId,
        mode: Mode,
        persist: bool,
    ) -> Result<ChancesResult, ChancesServiceError> {
        let snapshot = self.snapshot(profile_id)?;
        self.assess_loaded(&snapshot, school_id, mode, persist, AssessmentPath::Refined)
            .await
    }

    /// Holistic assessments for several schools, `BATCH_CONCURRENCY` at a time.
    ///
    /// The snapshot is built once. A school whose assessment fails is logged and left out of
    /// the map; only a missing or unreadable profile, or an exhausted plan, fails the whole call.
    /// Schools past the plan's remaining allowance are skipped before any model call.
    #[instrument(
        skip_all,
        fields(profile_id = %profile_id, schools = school_ids.len(), mode = mode.label())
    )]
    pub async fn assess_many(
        &self,
        profile_id: &ProfileId,
        school_ids: &[SchoolId],
        mode: Mode,
        persist: bool,
    ) -> Result<BTreeMap<SchoolId, ChancesResult>, ChancesServiceError> {
        let snapshot = self.snapshot(profile_id)?;
        let mut results = BTreeMap::new();
        if school_ids.is_empty() {
            return Ok(results);
        }

        let admitted = match self.remaining_allowance(profile_id)? {
            Some(remaining) if remaining < school_ids.len() => {
                warn!(
                    remaining,
                    skipped = school_ids.len() - remaining,
                    "usage allowance covers only part of the batch"
                );
                &school_ids[..remaining]
            }
            _ => school_ids,
        };

        for batch in admitted.chunks(BATCH_CONCURRENCY) {
            let outcomes = join_all(batch.iter().map(|school_id| {
                self.assess_loaded(&snapshot, school_id, mode, persist, AssessmentPath::Holistic)
            }))
            .await;

            for (school_id, outcome) in batch.iter().zip(outcomes) {
                match outcome {
                    Ok(result) => {
                        results.insert(school_id.clone(), result);
                    }
                    Err(err) => {
                        warn!(%school_id, error = %err, "skipping school after failed assessment");
                    }
                }
            }
        }

        info!(
            requested = school_ids.len(),
            assessed = results.len(),
            "batch assessment finished"
        );
        Ok(results)
    }

    fn snapshot(&self, profile_id: &ProfileId) -> Result<ProfileSnapshot, ChancesServiceError> {
        self.snapshots
            .load(profile_id, SnapshotOptions::default())?
            .ok_or_else(|| ChancesServiceError::ProfileNotFound(profile_id.clone()))
    }

    fn school(&self, school_id: &SchoolId) -> Result<ExtendedSchoolData, ChancesServiceError> {
        self.schools
            .fetch_school(school_id)?
            .ok_or_else(|| ChancesServiceError::SchoolNotFound(school_id.clone()))
    }

    /// Assessments still allowed this period; `None` when the plan is unlimited.
    fn remaining_allowance(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Option<usize>, ChancesServiceError> {
        let tier = SubscriptionTier::parse(&self.usage.subscription_tier(profile_id)?);
        let used = self.usage.usage_count(profile_id)?;
        self.limits.check(tier, used)?;
        Ok(self
            .limits
            .limit_for(tier)
            .map(|limit| limit.saturating_sub(used) as usize))
    }

    async fn assess_loaded(
        &self,
        snapshot: &ProfileSnapshot,
        school_id: &SchoolId,
        mode: Mode,
        persist: bool,
        path: AssessmentPath,
    ) -> Result<ChancesResult, ChancesServiceError> {
        let school = self.school(school_id)?;
        self.remaining_allowance(&snapshot.id)?;

        let result = match path {
            AssessmentPath::Holistic => self.holistic.assess(snapshot, &school, mode).await?,
            AssessmentPath::Refined => {
                let quantitative = calculate_quantitative(snapshot, &school.stats);
                self.refiner
                    .refine(snapshot, &school, &quantitative, mode)
                    .await
            }
        };
        if persist {
            self.persist(snapshot, school_id, &result);
        }
        self.usage.record_usage(&snapshot.id)?;
        Ok(result)
    }

    /// Writes the cached decimal onto the school-list row. Failed writes are logged, not returned.
    fn persist(&self, snapshot: &ProfileSnapshot, school_id: &SchoolId, result: &ChancesResult) {
        let Some(entry) = snapshot.school_list_entry(school_id) else {
            debug!(%school_id, "school is not on the student's list; nothing to cache");
            return;
        };
        if let Err(err) =
            self.profiles
                .update_cached_chance(&entry.id, result.cached_decimal(), Utc::now())
        {
            warn!(%school_id, error = %err, "failed to cache chance on the school list");
        }
    }
}

/// Error raised by the chances service.
#[derive(Debug, thiserror::Error)]
pub enum ChancesServiceError {
    #[error("profile {0} not found")]
    ProfileNotFound(ProfileId),
    #[error("school {0} not found")]
    SchoolNotFound(SchoolId),
    #[error(transparent)]
    UsageLimit(#[from] UsageLimitExceeded),
    #[error(transparent)]
    Assessment(#[from] AssessmentError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ChancesServiceError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChancesServiceError::Assessment(_))
    }
}
