use chrono::{DateTime, Utc};
use counselor::chances::{
    ExtendedSchoolData, Mode, ProfileId, ProfileRecord, ProfileRepository, RepositoryError,
    SchoolId, SchoolListId, SchoolRepository, UsageLedger,
};
use counselor::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn guard<'a, T>(
    mutex: &'a Mutex<T>,
    store: &str,
) -> Result<MutexGuard<'a, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable(format!("{store} lock poisoned")))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfiles {
    records: Arc<Mutex<HashMap<ProfileId, ProfileRecord>>>,
}

impl InMemoryProfiles {
    pub(crate) fn with(records: impl IntoIterator<Item = ProfileRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }
}

impl ProfileRepository for InMemoryProfiles {
    fn load_profile(&self, id: &ProfileId) -> Result<Option<ProfileRecord>, RepositoryError> {
        let records = guard(&self.records, "profile store")?;
        Ok(records.get(id).cloned())
    }

    fn update_cached_chance(
        &self,
        school_list_id: &SchoolListId,
        probability: f64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut records = guard(&self.records, "profile store")?;
        let row = records
            .values_mut()
            .flat_map(|record| record.school_list.iter_mut())
            .find(|row| &row.id == school_list_id)
            .ok_or(RepositoryError::NotFound)?;
        row.cached_chance = Some(probability);
        row.chance_updated_at = Some(updated_at);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySchools {
    schools: Arc<HashMap<SchoolId, ExtendedSchoolData>>,
}

impl InMemorySchools {
    pub(crate) fn with(schools: impl IntoIterator<Item = ExtendedSchoolData>) -> Self {
        let schools = schools
            .into_iter()
            .map(|school| (school.stats.id.clone(), school))
            .collect();
        Self {
            schools: Arc::new(schools),
        }
    }
}

impl SchoolRepository for InMemorySchools {
    fn fetch_school(&self, id: &SchoolId) -> Result<Option<ExtendedSchoolData>, RepositoryError> {
        Ok(self.schools.get(id).cloned())
    }
}

/// Usage ledger kept in process memory. Profiles without a recorded tier are on the free plan.
#[derive(Default, Clone)]
pub(crate) struct InMemoryUsageLedger {
    tiers: Arc<Mutex<HashMap<ProfileId, String>>>,
    counts: Arc<Mutex<HashMap<ProfileId, u32>>>,
}

impl InMemoryUsageLedger {
    pub(crate) fn with_tier(self, profile_id: ProfileId, tier: &str) -> Self {
        if let Ok(mut tiers) = self.tiers.lock() {
            tiers.insert(profile_id, tier.to_string());
        }
        self
    }
}

impl UsageLedger for InMemoryUsageLedger {
    fn subscription_tier(&self, profile_id: &ProfileId) -> Result<String, RepositoryError> {
        let tiers = guard(&self.tiers, "usage ledger")?;
        Ok(tiers
            .get(profile_id)
            .cloned()
            .unwrap_or_else(|| "free".to_string()))
    }

    fn usage_count(&self, profile_id: &ProfileId) -> Result<u32, RepositoryError> {
        let counts = guard(&self.counts, "usage ledger")?;
        Ok(counts.get(profile_id).copied().unwrap_or(0))
    }

    fn record_usage(&self, profile_id: &ProfileId) -> Result<(), RepositoryError> {
        let mut counts = guard(&self.counts, "usage ledger")?;
        *counts.entry(profile_id.clone()).or_insert(0) += 1;
        Ok(())
    }
}

pub(crate) fn parse_mode(raw: &str) -> Result<Mode, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "current" => Ok(Mode::Current),
        "projected" => Ok(Mode::Projected),
        "simulated" => Ok(Mode::Simulated),
        other => Err(format!(
            "unknown mode '{other}' (expected current, projected, or simulated)"
        )),
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{demo_profile, demo_schools, DEMO_PROFILE};

    #[test]
    fn cached_chance_lands_on_the_matching_row() {
        let profiles = InMemoryProfiles::with([demo_profile().expect("demo profile")]);
        let row = SchoolListId("list-state".to_string());
        profiles
            .update_cached_chance(&row, 0.57, Utc::now())
            .expect("row updated");

        let record = profiles
            .load_profile(&ProfileId(DEMO_PROFILE.to_string()))
            .expect("store readable")
            .expect("profile present");
        let cached = record
            .school_list
            .iter()
            .find(|entry| entry.id == row)
            .and_then(|entry| entry.cached_chance);
        assert_eq!(cached, Some(0.57));
    }

    #[test]
    fn unknown_school_list_row_is_not_found() {
        let profiles = InMemoryProfiles::with([demo_profile().expect("demo profile")]);
        let result = profiles.update_cached_chance(
            &SchoolListId("missing".to_string()),
            0.5,
            Utc::now(),
        );
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[test]
    fn ledger_defaults_to_free_and_counts_usage() {
        let student = ProfileId("someone".to_string());
        let ledger = InMemoryUsageLedger::default();
        assert_eq!(ledger.subscription_tier(&student).expect("tier"), "free");

        ledger.record_usage(&student).expect("recorded");
        ledger.record_usage(&student).expect("recorded");
        assert_eq!(ledger.usage_count(&student).expect("count"), 2);

        let ledger = ledger.with_tier(student.clone(), "premium");
        assert_eq!(ledger.subscription_tier(&student).expect("tier"), "premium");
    }

    #[test]
    fn schools_are_keyed_by_id() {
        let schools = InMemorySchools::with(demo_schools().expect("demo schools"));
        let found = schools
            .fetch_school(&SchoolId("state-u".to_string()))
            .expect("readable");
        assert!(found.is_some());
        assert!(schools
            .fetch_school(&SchoolId("nowhere".to_string()))
            .expect("readable")
            .is_none());
    }

    #[test]
    fn mode_parser_accepts_known_labels() {
        assert_eq!(parse_mode("Projected"), Ok(Mode::Projected));
        assert!(parse_mode("someday").is_err());
    }
}
