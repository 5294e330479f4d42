use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{AwardItem, CourseItem, GoalStatus, ItemStatus, ProgramItem};
use crate::chances::school::SchoolData;

/// Identifier wrapper for student profiles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub String);

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for one row of a student's school list.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolListId(pub String);

/// Student profile as held by the profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: ProfileId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub preferred_name: Option<String>,
    #[serde(default)]
    pub grade: Option<u8>,
    #[serde(default)]
    pub graduation_year: Option<u16>,
    #[serde(default)]
    pub high_school: Option<HighSchoolRecord>,
    #[serde(default)]
    pub academics: Option<AcademicRecord>,
    #[serde(default)]
    pub test_scores: Vec<TestScoreRecord>,
    #[serde(default)]
    pub ap_scores: Vec<ApScoreRecord>,
    #[serde(default)]
    pub activities: Vec<ActivityRecord>,
    #[serde(default)]
    pub awards: Vec<AwardItem>,
    #[serde(default)]
    pub programs: Vec<ProgramItem>,
    #[serde(default)]
    pub courses: Vec<CourseItem>,
    #[serde(default)]
    pub goals: Vec<GoalRecord>,
    #[serde(default)]
    pub school_list: Vec<SchoolListRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighSchoolRecord {
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub school_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicRecord {
    #[serde(default)]
    pub gpa_unweighted: Option<f64>,
    #[serde(default)]
    pub gpa_weighted: Option<f64>,
    #[serde(default)]
    pub gpa_scale: Option<f64>,
    #[serde(default)]
    pub class_rank: Option<u32>,
    #[serde(default)]
    pub class_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Sat,
    Act,
    Psat,
}

/// One sitting of a standardized test. `total` is the SAT/PSAT total or ACT composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestScoreRecord {
    pub kind: TestKind,
    pub total: u16,
    #[serde(default)]
    pub math: Option<u16>,
    #[serde(default)]
    pub reading_writing: Option<u16>,
    #[serde(default)]
    pub english: Option<u16>,
    #[serde(default)]
    pub reading: Option<u16>,
    #[serde(default)]
    pub science: Option<u16>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub taken_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApScoreRecord {
    pub subject: String,
    pub score: u8,
    #[serde(default)]
    pub year: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Explicit leadership flag; when absent the role title decides.
    #[serde(default)]
    pub is_leadership: Option<bool>,
    #[serde(default)]
    pub is_spike: bool,
    #[serde(default)]
    pub hours_per_week: Option<f64>,
    #[serde(default)]
    pub weeks_per_year: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ItemStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    pub status: GoalStatus,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub tasks: Vec<GoalTaskRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalTaskRecord {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// School-list row with a denormalized copy of the school's stats and the cached chance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolListRecord {
    pub id: SchoolListId,
    pub school: SchoolData,
    #[serde(default)]
    pub student_label: Option<String>,
    #[serde(default)]
    pub application_status: Option<String>,
    /// Cached probability as a decimal (`0.42` for 42%).
    #[serde(default)]
    pub cached_chance: Option<f64>,
    #[serde(default)]
    pub chance_updated_at: Option<DateTime<Utc>>,
}
