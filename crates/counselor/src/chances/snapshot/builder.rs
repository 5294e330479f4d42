use std::sync::Arc;

use tracing::debug;

use super::records::{
    AcademicRecord, ActivityRecord, GoalRecord, ProfileId, ProfileRecord, SchoolListRecord,
    TestKind, TestScoreRecord,
};
use super::{
    AcademicsSnapshot, ActScore, ActivityItem, ApExam, AwardLevel, CourseLevel, GoalItem,
    HighSchool, ItemStatus, ProfileCounts, ProfileSnapshot, SatScore, SchoolListItem,
    StudentName, TestingSnapshot,
};
use crate::chances::domain::probability_from_decimal;
use crate::chances::repository::{ProfileRepository, RepositoryError};

/// Which optional collections to materialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub include_goals: bool,
    pub include_schools: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            include_goals: true,
            include_schools: true,
        }
    }
}

/// Loads profile records from the store and projects them into snapshots.
pub struct SnapshotBuilder<P> {
    profiles: Arc<P>,
}

impl<P> SnapshotBuilder<P>
where
    P: ProfileRepository,
{
    pub fn new(profiles: Arc<P>) -> Self {
        Self { profiles }
    }

    /// `Ok(None)` when the profile does not exist.
    pub fn load(
        &self,
        profile_id: &ProfileId,
        options: SnapshotOptions,
    ) -> Result<Option<ProfileSnapshot>, RepositoryError> {
        let Some(record) = self.profiles.load_profile(profile_id)? else {
            debug!(%profile_id, "profile not found");
            return Ok(None);
        };
        Ok(Some(build_snapshot(&record, options)))
    }
}

const LEADERSHIP_TITLES: &[&str] = &[
    "president",
    "vice president",
    "captain",
    "founder",
    "chair",
    "chairperson",
    "editor",
    "director",
    "lead",
    "leader",
    "head",
    "officer",
    "manager",
];

pub fn build_snapshot(record: &ProfileRecord, options: SnapshotOptions) -> ProfileSnapshot {
    let academics = academics(record.academics.as_ref());
    let testing = testing(record);
    let activities: Vec<ActivityItem> = record.activities.iter().map(activity).collect();

    let goals = if options.include_goals {
        record.goals.iter().map(goal).collect()
    } else {
        Vec::new()
    };
    let school_list = if options.include_schools {
        record.school_list.iter().map(school_list_item).collect()
    } else {
        Vec::new()
    };

    let counts = ProfileCounts {
        activities: count(activities.iter().map(|item| (item.status, true))),
        leadership: count(activities.iter().map(|item| (item.status, item.leadership))),
        spikes: count(activities.iter().map(|item| (item.status, item.spike))),
        national_awards: count(
            record
                .awards
                .iter()
                .map(|award| (award.status, award.level >= AwardLevel::National)),
        ),
        selective_programs: count(
            record
                .programs
                .iter()
                .map(|program| (program.status, program.is_selective())),
        ),
        ap_courses: count(
            record
                .courses
                .iter()
                .map(|course| (course.status, course.level == CourseLevel::Ap)),
        ),
    };

    ProfileSnapshot {
        id: record.id.clone(),
        name: StudentName {
            first: record.first_name.clone(),
            last: record.last_name.clone(),
            preferred: record.preferred_name.clone(),
        },
        grade: record.grade,
        graduation_year: record.graduation_year,
        high_school: record.high_school.as_ref().map(|school| HighSchool {
            name: school.name.clone(),
            location: match (&school.city, &school.state) {
                (Some(city), Some(state)) => Some(format!("{city}, {state}")),
                (Some(city), None) => Some(city.clone()),
                (None, state) => state.clone(),
            },
            school_type: school.school_type.clone(),
        }),
        academics,
        testing,
        activities,
        awards: record.awards.clone(),
        programs: record.programs.clone(),
        courses: record.courses.clone(),
        goals,
        school_list,
        counts,
    }
}

fn count(items: impl Iterator<Item = (ItemStatus, bool)>) -> u32 {
    items
        .filter(|(status, matched)| *status == ItemStatus::Actual && *matched)
        .count() as u32
}

fn academics(record: Option<&AcademicRecord>) -> AcademicsSnapshot {
    let record = record.cloned().unwrap_or_default();
    AcademicsSnapshot {
        gpa_unweighted: record.gpa_unweighted,
        gpa_weighted: record.gpa_weighted,
        gpa_scale: record
            .gpa_scale
            .filter(|scale| *scale > 0.0)
            .unwrap_or(AcademicsSnapshot::DEFAULT_SCALE),
        class_rank: record.class_rank,
        class_size: record.class_size,
        percentile: percentile(record.class_rank, record.class_size),
    }
}

fn percentile(rank: Option<u32>, size: Option<u32>) -> Option<f64> {
    match (rank, size) {
        (Some(rank), Some(size)) if size > 0 && rank >= 1 && rank <= size => {
            let below = f64::from(size - rank);
            Some((below / f64::from(size) * 1000.0).round() / 10.0)
        }
        _ => None,
    }
}

/// Flagged primary sitting first, else the highest total. Ties keep stored order.
fn primary_score(scores: &[TestScoreRecord], kind: TestKind) -> Option<&TestScoreRecord> {
    let mut sittings = scores.iter().filter(|score| score.kind == kind);
    if let Some(flagged) = scores
        .iter()
        .find(|score| score.kind == kind && score.is_primary)
    {
        return Some(flagged);
    }
    let first = sittings.next()?;
    Some(sittings.fold(first, |best, candidate| {
        if candidate.total > best.total {
            candidate
        } else {
            best
        }
    }))
}

fn testing(record: &ProfileRecord) -> TestingSnapshot {
    let sat = primary_score(&record.test_scores, TestKind::Sat).map(|score| SatScore {
        total: score.total,
        math: score.math,
        reading_writing: score.reading_writing,
    });
    let act = primary_score(&record.test_scores, TestKind::Act).map(|score| ActScore {
        composite: score.total,
        english: score.english,
        math: score.math,
        reading: score.reading,
        science: score.science,
    });
    let psat = primary_score(&record.test_scores, TestKind::Psat).map(|score| score.total);

    TestingSnapshot {
        sat,
        act,
        psat,
        ap_exams: record
            .ap_scores
            .iter()
            .map(|exam| ApExam {
                subject: exam.subject.clone(),
                score: exam.score,
                year: exam.year,
            })
            .collect(),
    }
}

fn activity(record: &ActivityRecord) -> ActivityItem {
    let leadership = record.is_leadership.unwrap_or_else(|| {
        record
            .role
            .as_deref()
            .map(is_leadership_title)
            .unwrap_or(false)
    });
    let annual_hours = match (record.hours_per_week, record.weeks_per_year) {
        (Some(hours), Some(weeks)) if hours > 0.0 && weeks > 0.0 => {
            Some((hours * weeks).round() as u32)
        }
        _ => None,
    };

    ActivityItem {
        name: record.name.clone(),
        category: record.category.clone(),
        role: record.role.clone(),
        leadership,
        spike: record.is_spike,
        annual_hours,
        description: record.description.clone(),
        status: record.status,
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

/// A role is leadership when a title appears in it as whole words ("Co-Founder", not "Ahead").
fn is_leadership_title(role: &str) -> bool {
    let role = words(role);
    LEADERSHIP_TITLES.iter().any(|title| {
        let title = words(title);
        role.windows(title.len()).any(|window| window == title.as_slice())
    })
}

fn goal(record: &GoalRecord) -> GoalItem {
    GoalItem {
        title: record.title.clone(),
        category: record.category.clone(),
        status: record.status,
        target_date: record.target_date,
        tasks_total: record.tasks.len() as u32,
        tasks_completed: record.tasks.iter().filter(|task| task.completed).count() as u32,
    }
}

fn school_list_item(record: &SchoolListRecord) -> SchoolListItem {
    SchoolListItem {
        id: record.id.clone(),
        school_id: record.school.id.clone(),
        school_name: record.school.name.clone(),
        acceptance_rate: record.school.acceptance_rate,
        sat_range: record.school.sat_range,
        act_range: record.school.act_range,
        student_label: record.student_label.clone(),
        cached_probability: record.cached_chance.and_then(probability_from_decimal),
        chance_updated_at: record.chance_updated_at,
    }
}
