use chrono::{DateTime, Utc};

use super::school::{ExtendedSchoolData, SchoolId};
use super::snapshot::{ProfileId, ProfileRecord, SchoolListId};

/// Student profile storage. The schema beyond [`ProfileRecord`] belongs to the store.
pub trait ProfileRepository: Send + Sync {
    fn load_profile(&self, id: &ProfileId) -> Result<Option<ProfileRecord>, RepositoryError>;

    /// Write the cached chance (decimal, `0.42` for 42%) onto a school-list row.
    fn update_cached_chance(
        &self,
        school_list_id: &SchoolListId,
        probability: f64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

/// Read-only school reference data.
pub trait SchoolRepository: Send + Sync {
    fn fetch_school(&self, id: &SchoolId) -> Result<Option<ExtendedSchoolData>, RepositoryError>;
}

/// Subscription tier and metered usage, owned by the billing side of the product.
pub trait UsageLedger: Send + Sync {
    /// Raw tier string as stored by billing (`free`, `standard`, `premium`, legacy `paid`).
    fn subscription_tier(&self, profile_id: &ProfileId) -> Result<String, RepositoryError>;
    fn usage_count(&self, profile_id: &ProfileId) -> Result<u32, RepositoryError>;
    fn record_usage(&self, profile_id: &ProfileId) -> Result<(), RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
