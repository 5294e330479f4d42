//! Normalized, read-only projection of a student profile taken at assessment time.
//!
//! Snapshots are produced only by [`build_snapshot`]. Downstream code borrows them and never
//! mutates them; the derived [`ProfileCounts`] would go stale otherwise. Rebuild instead.

mod builder;
mod records;

pub use builder::{build_snapshot, SnapshotBuilder, SnapshotOptions};
pub use records::{
    AcademicRecord, ActivityRecord, ApScoreRecord, GoalRecord, GoalTaskRecord, HighSchoolRecord,
    ProfileId, ProfileRecord, SchoolListId, SchoolListRecord, TestKind, TestScoreRecord,
};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::school::{ScoreRange, SchoolId};

/// Whether an achievement already happened, is underway, or is only planned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Actual,
    InProgress,
    Planning,
}

impl ItemStatus {
    /// Prompt marker for items that are not yet real.
    pub const fn marker(self) -> Option<&'static str> {
        match self {
            ItemStatus::Actual => None,
            ItemStatus::InProgress => Some("[IN PROGRESS]"),
            ItemStatus::Planning => Some("[PLANNED]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Planning,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentName {
    pub first: String,
    pub last: String,
    pub preferred: Option<String>,
}

impl StudentName {
    pub fn display(&self) -> String {
        let first = self.preferred.as_deref().unwrap_or(&self.first);
        format!("{first} {}", self.last).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighSchool {
    pub name: String,
    pub location: Option<String>,
    pub school_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicsSnapshot {
    pub gpa_unweighted: Option<f64>,
    pub gpa_weighted: Option<f64>,
    pub gpa_scale: f64,
    pub class_rank: Option<u32>,
    pub class_size: Option<u32>,
    /// Share of the class ranked below the student, `0..=100`.
    pub percentile: Option<f64>,
}

impl AcademicsSnapshot {
    pub const DEFAULT_SCALE: f64 = 4.0;

    /// GPA on a 4.0 scale: unweighted first, else weighted capped at the scale.
    pub fn normalized_gpa(&self) -> Option<f64> {
        let scale = if self.gpa_scale > 0.0 {
            self.gpa_scale
        } else {
            Self::DEFAULT_SCALE
        };
        let raw = match (self.gpa_unweighted, self.gpa_weighted) {
            (Some(unweighted), _) => unweighted.min(scale),
            (None, Some(weighted)) => weighted.min(scale),
            (None, None) => return None,
        };
        if !raw.is_finite() || raw < 0.0 {
            return None;
        }
        Some(raw * Self::DEFAULT_SCALE / scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SatScore {
    pub total: u16,
    pub math: Option<u16>,
    pub reading_writing: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActScore {
    pub composite: u16,
    pub english: Option<u16>,
    pub math: Option<u16>,
    pub reading: Option<u16>,
    pub science: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApExam {
    pub subject: String,
    pub score: u8,
    pub year: Option<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestingSnapshot {
    pub sat: Option<SatScore>,
    pub act: Option<ActScore>,
    pub psat: Option<u16>,
    pub ap_exams: Vec<ApExam>,
}

impl TestingSnapshot {
    pub fn has_admission_test(&self) -> bool {
        self.sat.is_some() || self.act.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub name: String,
    pub category: Option<String>,
    pub role: Option<String>,
    pub leadership: bool,
    pub spike: bool,
    pub annual_hours: Option<u32>,
    pub description: Option<String>,
    pub status: ItemStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardLevel {
    School,
    Regional,
    State,
    National,
    International,
}

impl AwardLevel {
    pub const fn label(self) -> &'static str {
        match self {
            AwardLevel::School => "school",
            AwardLevel::Regional => "regional",
            AwardLevel::State => "state",
            AwardLevel::National => "national",
            AwardLevel::International => "international",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardItem {
    pub title: String,
    pub level: AwardLevel,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ItemStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramSelectivity {
    HighlySelective,
    Selective,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramItem {
    pub name: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub selectivity: Option<ProgramSelectivity>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub status: ItemStatus,
}

impl ProgramItem {
    pub fn is_selective(&self) -> bool {
        matches!(
            self.selectivity,
            Some(ProgramSelectivity::HighlySelective | ProgramSelectivity::Selective)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseLevel {
    Regular,
    Honors,
    Ap,
    Ib,
    DualEnrollment,
}

impl CourseLevel {
    pub const fn label(self) -> &'static str {
        match self {
            CourseLevel::Regular => "regular",
            CourseLevel::Honors => "honors",
            CourseLevel::Ap => "AP",
            CourseLevel::Ib => "IB",
            CourseLevel::DualEnrollment => "dual enrollment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseItem {
    pub name: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub level: CourseLevel,
    #[serde(default)]
    pub final_grade: Option<String>,
    #[serde(default)]
    pub status: ItemStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalItem {
    pub title: String,
    pub category: Option<String>,
    pub status: GoalStatus,
    pub target_date: Option<NaiveDate>,
    pub tasks_total: u32,
    pub tasks_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolListItem {
    pub id: SchoolListId,
    pub school_id: SchoolId,
    pub school_name: String,
    pub acceptance_rate: Option<f64>,
    pub sat_range: Option<ScoreRange>,
    pub act_range: Option<ScoreRange>,
    pub student_label: Option<String>,
    pub cached_probability: Option<u8>,
    pub chance_updated_at: Option<DateTime<Utc>>,
}

/// Aggregates over `actual` items, computed once by the builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCounts {
    pub activities: u32,
    pub leadership: u32,
    pub spikes: u32,
    pub national_awards: u32,
    pub selective_programs: u32,
    pub ap_courses: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub id: ProfileId,
    pub name: StudentName,
    pub grade: Option<u8>,
    pub graduation_year: Option<u16>,
    pub high_school: Option<HighSchool>,
    pub academics: AcademicsSnapshot,
    pub testing: TestingSnapshot,
    pub activities: Vec<ActivityItem>,
    pub awards: Vec<AwardItem>,
    pub programs: Vec<ProgramItem>,
    pub courses: Vec<CourseItem>,
    pub goals: Vec<GoalItem>,
    pub school_list: Vec<SchoolListItem>,
    pub counts: ProfileCounts,
}

impl ProfileSnapshot {
    pub fn school_list_entry(&self, school_id: &SchoolId) -> Option<&SchoolListItem> {
        self.school_list
            .iter()
            .find(|entry| &entry.school_id == school_id)
    }
}
