use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::chances::llm::{CompletionClient, LlmError, ModelRoute, StructuredSchema};
use crate::chances::repository::{
    ProfileRepository, RepositoryError, SchoolRepository, UsageLedger,
};
use crate::chances::school::{ExtendedSchoolData, SchoolId};
use crate::chances::snapshot::{
    build_snapshot, ProfileId, ProfileRecord, ProfileSnapshot, SchoolListId, SnapshotOptions,
};
use crate::chances::{chances_router, ChancesService, UsageLimits};

pub(super) const STUDENT: &str = "student-1";
pub(super) const PLANNED_ACTIVITY: &str = "Neighborhood Coding Camp";

pub(super) fn student_id() -> ProfileId {
    ProfileId(STUDENT.to_string())
}

pub(super) fn school_id(id: &str) -> SchoolId {
    SchoolId(id.to_string())
}

fn school_row(row: &str, school: &ExtendedSchoolData) -> Value {
    json!({
        "id": row,
        "school": serde_json::to_value(&school.stats).expect("school stats serialize"),
        "studentLabel": "target"
    })
}

/// GPA 4.0 and SAT 1550 with one planned activity; MIT and State University on the list.
pub(super) fn strong_record() -> ProfileRecord {
    serde_json::from_value(json!({
        "id": STUDENT,
        "firstName": "Maya",
        "lastName": "Chen",
        "grade": 12,
        "graduationYear": 2026,
        "academics": { "gpaUnweighted": 4.0, "gpaWeighted": 4.6, "classRank": 3, "classSize": 410 },
        "testScores": [
            { "kind": "sat", "total": 1550, "math": 790, "readingWriting": 760, "isPrimary": true }
        ],
        "activities": [
            {
                "name": "Robotics Team",
                "role": "Captain",
                "isSpike": true,
                "hoursPerWeek": 12.0,
                "weeksPerYear": 36.0
            },
            { "name": PLANNED_ACTIVITY, "role": "Founder", "status": "planning" }
        ],
        "awards": [
            { "title": "FIRST Robotics State Champion", "level": "state", "year": 2025 }
        ],
        "schoolList": [
            school_row("row-mit", &selective_school()),
            school_row("row-state", &state_school())
        ]
    }))
    .expect("strong profile fixture")
}

/// No GPA and no test scores.
pub(super) fn sparse_record(id: &str) -> ProfileRecord {
    serde_json::from_value(json!({
        "id": id,
        "firstName": "Sam",
        "lastName": "Ortiz"
    }))
    .expect("sparse profile fixture")
}

pub(super) fn selective_school() -> ExtendedSchoolData {
    serde_json::from_value(json!({
        "id": "mit",
        "name": "MIT",
        "acceptanceRate": 0.04,
        "satRange": { "p25": 1500, "p75": 1570 },
        "actRange": { "p25": 34, "p75": 36 },
        "admissionPlans": { "earlyAction": true },
        "whatSchoolValues": "Hands-on builders who collaborate.",
        "city": "Cambridge",
        "state": "MA",
        "institutionType": "private"
    }))
    .expect("selective school fixture")
}

pub(super) fn state_school() -> ExtendedSchoolData {
    serde_json::from_value(json!({
        "id": "state-u",
        "name": "State University",
        "acceptanceRate": 0.62,
        "satRange": { "p25": 1150, "p75": 1350 },
        "averageGpa": 3.5,
        "institutionType": "public"
    }))
    .expect("state school fixture")
}

pub(super) fn unknown_school() -> ExtendedSchoolData {
    serde_json::from_value(json!({ "id": "mystery", "name": "Mystery College" }))
        .expect("unknown school fixture")
}

pub(super) fn snapshot_of(record: &ProfileRecord) -> ProfileSnapshot {
    build_snapshot(record, SnapshotOptions::default())
}

fn factor(score: u8, impact: &str) -> Value {
    json!({ "score": score, "impact": impact, "explanation": "reviewed" })
}

/// Well-formed structured holistic output.
pub(super) fn holistic_response(probability: u8) -> Value {
    json!({
        "probability": probability,
        "tier": "target",
        "factors": {
            "academics": factor(95, "strong_positive"),
            "testing": factor(88, "strong_positive"),
            "activities": factor(80, "positive"),
            "awards": factor(60, "neutral")
        },
        "summary": "Strong academics with sustained robotics leadership.",
        "improvements": [
            { "action": "Compete at a national level", "priority": "high", "category": "awards" },
            { "action": "Document robotics outcomes", "priority": "medium", "category": "activities" }
        ],
        "confidence": "medium",
        "confidenceReason": "Award detail is limited"
    })
}

/// Legacy refiner output wrapped the way chat models tend to format it.
pub(super) fn refinement_text(adjustment: i32) -> String {
    let body = json!({
        "factors": {
            "activities": factor(82, "positive"),
            "awards": { "score": 58, "explanation": "State-level recognition" }
        },
        "adjustment": adjustment,
        "summary": "Robotics leadership strengthens the application.",
        "improvements": [{ "action": "Publish a project write-up", "priority": "low" }]
    });
    format!("Here is the assessment.\n```json\n{body}\n```")
}

#[derive(Debug, Clone)]
pub(super) enum Script {
    Json(Value),
    Text(String),
    Fail,
}

#[derive(Debug, Clone)]
pub(super) struct RecordedCall {
    pub route: ModelRoute,
    pub prompt: String,
}

/// Completion double answering by the first rule whose needle appears in the prompt.
pub(super) struct ScriptedClient {
    rules: Vec<(String, Script)>,
    fallback: Script,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub(super) fn always(script: Script) -> Self {
        Self {
            rules: Vec::new(),
            fallback: script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn when(mut self, needle: &str, script: Script) -> Self {
        self.rules.push((needle.to_string(), script));
        self
    }

    pub(super) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    fn answer(&self, route: ModelRoute, prompt: &str) -> Script {
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(RecordedCall {
                route,
                prompt: prompt.to_string(),
            });
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, script)| script.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

fn upstream_failure() -> LlmError {
    LlmError::Status {
        status: 503,
        body: "model overloaded".to_string(),
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        route: ModelRoute,
        _system: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        match self.answer(route, prompt) {
            Script::Json(value) => Ok(value.to_string()),
            Script::Text(text) => Ok(text),
            Script::Fail => Err(upstream_failure()),
        }
    }

    async fn complete_structured(
        &self,
        route: ModelRoute,
        _system: &str,
        prompt: &str,
        _schema: &StructuredSchema,
    ) -> Result<Value, LlmError> {
        match self.answer(route, prompt) {
            Script::Json(value) => Ok(value),
            Script::Text(text) => Ok(serde_json::from_str(&text)?),
            Script::Fail => Err(upstream_failure()),
        }
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryProfiles {
    records: Arc<Mutex<HashMap<ProfileId, ProfileRecord>>>,
}

impl MemoryProfiles {
    pub(super) fn with(records: Vec<ProfileRecord>) -> Self {
        let profiles = Self::default();
        {
            let mut guard = profiles.records.lock().expect("profile mutex poisoned");
            for record in records {
                guard.insert(record.id.clone(), record);
            }
        }
        profiles
    }

    pub(super) fn cached_chance(&self, profile: &ProfileId, row: &str) -> Option<f64> {
        let guard = self.records.lock().expect("profile mutex poisoned");
        guard
            .get(profile)?
            .school_list
            .iter()
            .find(|entry| entry.id.0 == row)?
            .cached_chance
    }
}

impl ProfileRepository for MemoryProfiles {
    fn load_profile(&self, id: &ProfileId) -> Result<Option<ProfileRecord>, RepositoryError> {
        let guard = self.records.lock().expect("profile mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update_cached_chance(
        &self,
        school_list_id: &SchoolListId,
        probability: f64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("profile mutex poisoned");
        let entry = guard
            .values_mut()
            .flat_map(|record| record.school_list.iter_mut())
            .find(|entry| &entry.id == school_list_id)
            .ok_or(RepositoryError::NotFound)?;
        entry.cached_chance = Some(probability);
        entry.chance_updated_at = Some(updated_at);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySchools {
    schools: Arc<HashMap<SchoolId, ExtendedSchoolData>>,
}

impl MemorySchools {
    pub(super) fn with(schools: Vec<ExtendedSchoolData>) -> Self {
        Self {
            schools: Arc::new(
                schools
                    .into_iter()
                    .map(|school| (school.stats.id.clone(), school))
                    .collect(),
            ),
        }
    }
}

impl SchoolRepository for MemorySchools {
    fn fetch_school(&self, id: &SchoolId) -> Result<Option<ExtendedSchoolData>, RepositoryError> {
        Ok(self.schools.get(id).cloned())
    }
}

pub(super) struct MemoryUsage {
    tier: String,
    counts: Mutex<HashMap<ProfileId, u32>>,
}

impl MemoryUsage {
    pub(super) fn new(tier: &str) -> Self {
        Self {
            tier: tier.to_string(),
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub(super) fn with_count(self, profile: &ProfileId, used: u32) -> Self {
        self.counts
            .lock()
            .expect("usage mutex poisoned")
            .insert(profile.clone(), used);
        self
    }

    pub(super) fn count(&self, profile: &ProfileId) -> u32 {
        self.counts
            .lock()
            .expect("usage mutex poisoned")
            .get(profile)
            .copied()
            .unwrap_or(0)
    }
}

impl UsageLedger for MemoryUsage {
    fn subscription_tier(&self, _profile_id: &ProfileId) -> Result<String, RepositoryError> {
        Ok(self.tier.clone())
    }

    fn usage_count(&self, profile_id: &ProfileId) -> Result<u32, RepositoryError> {
        Ok(self.count(profile_id))
    }

    fn record_usage(&self, profile_id: &ProfileId) -> Result<(), RepositoryError> {
        *self
            .counts
            .lock()
            .expect("usage mutex poisoned")
            .entry(profile_id.clone())
            .or_insert(0) += 1;
        Ok(())
    }
}

pub(super) struct UnavailableProfiles;

impl ProfileRepository for UnavailableProfiles {
    fn load_profile(&self, _id: &ProfileId) -> Result<Option<ProfileRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_cached_chance(
        &self,
        _school_list_id: &SchoolListId,
        _probability: f64,
        _updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Profile store that reads normally but refuses every cache write.
#[derive(Clone)]
pub(super) struct ReadOnlyProfiles(pub MemoryProfiles);

impl ProfileRepository for ReadOnlyProfiles {
    fn load_profile(&self, id: &ProfileId) -> Result<Option<ProfileRecord>, RepositoryError> {
        self.0.load_profile(id)
    }

    fn update_cached_chance(
        &self,
        _school_list_id: &SchoolListId,
        _probability: f64,
        _updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("replica is read-only".to_string()))
    }
}

/// Completion double that yields to the scheduler mid-call and tracks how many calls overlap.
#[derive(Default)]
pub(super) struct InFlightClient {
    current: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl InFlightClient {
    pub(super) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(super) fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    async fn answer(&self) -> Value {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        self.current.fetch_sub(1, Ordering::SeqCst);
        holistic_response(55)
    }
}

#[async_trait]
impl CompletionClient for InFlightClient {
    async fn complete(
        &self,
        _route: ModelRoute,
        _system: &str,
        _prompt: &str,
    ) -> Result<String, LlmError> {
        Ok(self.answer().await.to_string())
    }

    async fn complete_structured(
        &self,
        _route: ModelRoute,
        _system: &str,
        _prompt: &str,
        _schema: &StructuredSchema,
    ) -> Result<Value, LlmError> {
        Ok(self.answer().await)
    }
}

/// Service over the standard fixtures with a caller-supplied completion client.
pub(super) fn service_with_client(
    client: Arc<dyn CompletionClient>,
    usage: Arc<MemoryUsage>,
) -> MemoryService {
    ChancesService::new(
        Arc::new(MemoryProfiles::with(vec![strong_record()])),
        Arc::new(MemorySchools::with(vec![
            selective_school(),
            state_school(),
            unknown_school(),
        ])),
        usage,
        client,
        UsageLimits::default(),
    )
}

pub(super) type MemoryService = ChancesService<MemoryProfiles, MemorySchools, MemoryUsage>;

pub(super) struct Harness {
    pub service: Arc<MemoryService>,
    pub profiles: MemoryProfiles,
    pub usage: Arc<MemoryUsage>,
    pub client: Arc<ScriptedClient>,
}

pub(super) fn harness_with(client: ScriptedClient, usage: MemoryUsage) -> Harness {
    let profiles = MemoryProfiles::with(vec![strong_record(), sparse_record("student-2")]);
    let schools = MemorySchools::with(vec![selective_school(), state_school(), unknown_school()]);
    let usage = Arc::new(usage);
    let client = Arc::new(client);
    let service = Arc::new(ChancesService::new(
        Arc::new(profiles.clone()),
        Arc::new(schools),
        usage.clone(),
        client.clone(),
        UsageLimits::default(),
    ));
    Harness {
        service,
        profiles,
        usage,
        client,
    }
}

pub(super) fn harness(client: ScriptedClient) -> Harness {
    harness_with(client, MemoryUsage::new("premium"))
}

pub(super) fn router_for(harness: &Harness) -> axum::Router {
    chances_router(harness.service.clone())
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
