use crate::chances::domain::{Mode, Tier};
use crate::chances::quantitative::QuantitativeResult;
use crate::chances::school::ExtendedSchoolData;
use crate::chances::snapshot::{
    ActivityItem, AwardItem, CourseItem, GoalItem, GoalStatus, ItemStatus, ProfileSnapshot,
    ProgramItem,
};

pub(crate) const SYSTEM_PROMPT: &str = "\
You are an experienced college admissions counselor. \
Estimate a student's chance of admission to one school using the school profile, \
the student profile, and the quantitative baseline provided. \
Be calibrated: never exceed what the school's acceptance rate makes plausible, \
and never report certainty. Respond only with the requested JSON object.";

/// Snapshot collections filtered down to what the mode is allowed to see. Excluded items never
/// reach the prompt text.
pub(crate) struct ModeView<'a> {
    pub activities: Vec<&'a ActivityItem>,
    pub awards: Vec<&'a AwardItem>,
    pub programs: Vec<&'a ProgramItem>,
    pub courses: Vec<&'a CourseItem>,
    pub goals: Vec<&'a GoalItem>,
}

impl<'a> ModeView<'a> {
    pub fn new(snapshot: &'a ProfileSnapshot, mode: Mode) -> Self {
        Self {
            activities: snapshot
                .activities
                .iter()
                .filter(|item| mode.includes(item.status))
                .collect(),
            awards: snapshot
                .awards
                .iter()
                .filter(|item| mode.includes(item.status))
                .collect(),
            programs: snapshot
                .programs
                .iter()
                .filter(|item| mode.includes(item.status))
                .collect(),
            courses: snapshot
                .courses
                .iter()
                .filter(|item| mode.includes(item.status))
                .collect(),
            goals: snapshot
                .goals
                .iter()
                .filter(|goal| mode.includes_goal(goal.status))
                .collect(),
        }
    }
}

fn with_marker(text: String, status: ItemStatus) -> String {
    match status.marker() {
        Some(marker) => format!("{marker} {text}"),
        None => text,
    }
}

fn mode_instruction(mode: Mode) -> &'static str {
    match mode {
        Mode::Current => {
            "CURRENT: assess only what the student has already achieved. \
             Every item listed below is complete."
        }
        Mode::Projected => {
            "PROJECTED: assess the student as they are likely to look at application time. \
             Items marked [IN PROGRESS] and in-progress goals are trajectory; weigh them by how \
             far along they are, below completed work."
        }
        Mode::Simulated => {
            "SIMULATED: assess a hypothetical version of the student in which planned work also \
             happens. Items marked [IN PROGRESS] or [PLANNED] and all listed goals are \
             hypothetical; treat them as achieved but say so in the summary."
        }
    }
}

fn school_section(school: &ExtendedSchoolData, lines: &mut Vec<String>) {
    let stats = &school.stats;
    lines.push("## School profile".to_string());
    lines.push(format!("Name: {}", stats.name));
    if let Some(location) = school.location() {
        lines.push(format!("Location: {location}"));
    }
    if let Some(kind) = school.institution_type {
        lines.push(format!("Type: {}", kind.label()));
    }
    match stats.known_acceptance_rate() {
        Some(rate) => lines.push(format!("Acceptance rate: {:.1}%", rate * 100.0)),
        None => lines.push("Acceptance rate: unknown".to_string()),
    }
    if let Some(range) = stats.sat_range {
        lines.push(format!("SAT middle 50%: {}-{}", range.p25, range.p75));
    }
    if let Some(range) = stats.act_range {
        lines.push(format!("ACT middle 50%: {}-{}", range.p25, range.p75));
    }
    if let Some(gpa) = stats.average_gpa {
        lines.push(format!("Average admitted GPA: {gpa:.2}"));
    }
    if let Some(enrollment) = stats.undergraduate_enrollment {
        lines.push(format!("Undergraduate enrollment: {enrollment}"));
    }
    let plans = stats.admission_plans.labels();
    if !plans.is_empty() {
        lines.push(format!("Admission plans: {}", plans.join(", ")));
    }
    if let Some(deadlines) = &school.deadlines {
        lines.push(format!("Deadlines: {deadlines}"));
    }
    if !school.notable_programs.is_empty() {
        lines.push(format!(
            "Notable programs: {}",
            school.notable_programs.join(", ")
        ));
    }
    if let Some(values) = &stats.what_school_values {
        lines.push("What this school values:".to_string());
        lines.push(values.clone());
    }
}

fn student_section(snapshot: &ProfileSnapshot, view: &ModeView<'_>, lines: &mut Vec<String>) {
    lines.push("## Student profile".to_string());
    lines.push(format!("Name: {}", snapshot.name.display()));
    if let Some(grade) = snapshot.grade {
        lines.push(format!("Grade: {grade}"));
    }
    if let Some(year) = snapshot.graduation_year {
        lines.push(format!("Graduation year: {year}"));
    }
    if let Some(school) = &snapshot.high_school {
        let mut line = format!("High school: {}", school.name);
        if let Some(location) = &school.location {
            line.push_str(&format!(" ({location})"));
        }
        if let Some(kind) = &school.school_type {
            line.push_str(&format!(", {kind}"));
        }
        lines.push(line);
    }

    lines.push(String::new());
    lines.push("### Academics".to_string());
    let academics = &snapshot.academics;
    match (academics.gpa_unweighted, academics.gpa_weighted) {
        (None, None) => lines.push("GPA: not reported".to_string()),
        (unweighted, weighted) => {
            if let Some(gpa) = unweighted {
                lines.push(format!(
                    "Unweighted GPA: {gpa:.2} / {:.1}",
                    academics.gpa_scale
                ));
            }
            if let Some(gpa) = weighted {
                lines.push(format!("Weighted GPA: {gpa:.2}"));
            }
        }
    }
    if let (Some(rank), Some(size)) = (academics.class_rank, academics.class_size) {
        let mut line = format!("Class rank: {rank} of {size}");
        if let Some(percentile) = academics.percentile {
            line.push_str(&format!(" ({percentile:.1} percentile)"));
        }
        lines.push(line);
    }
    if !view.courses.is_empty() {
        lines.push("Courses:".to_string());
        for course in &view.courses {
            let mut text = format!("{} ({})", course.name, course.level.label());
            if let Some(grade) = &course.final_grade {
                text.push_str(&format!(", grade {grade}"));
            }
            lines.push(format!("- {}", with_marker(text, course.status)));
        }
    }

    lines.push(String::new());
    lines.push("### Testing".to_string());
    let testing = &snapshot.testing;
    if let Some(sat) = testing.sat {
        let mut line = format!("SAT: {}", sat.total);
        if let (Some(math), Some(reading)) = (sat.math, sat.reading_writing) {
            line.push_str(&format!(" (Math {math}, Reading/Writing {reading})"));
        }
        lines.push(line);
    }
    if let Some(act) = testing.act {
        let mut line = format!("ACT: {}", act.composite);
        let sections: Vec<String> = [
            ("English", act.english),
            ("Math", act.math),
            ("Reading", act.reading),
            ("Science", act.science),
        ]
        .into_iter()
        .filter_map(|(name, score)| score.map(|score| format!("{name} {score}")))
        .collect();
        if !sections.is_empty() {
            line.push_str(&format!(" ({})", sections.join(", ")));
        }
        lines.push(line);
    }
    if let Some(psat) = testing.psat {
        lines.push(format!("PSAT: {psat}"));
    }
    if !testing.has_admission_test() {
        lines.push("No SAT or ACT reported".to_string());
    }
    if !testing.ap_exams.is_empty() {
        let exams: Vec<String> = testing
            .ap_exams
            .iter()
            .map(|exam| format!("{} ({})", exam.subject, exam.score))
            .collect();
        lines.push(format!("AP exams: {}", exams.join(", ")));
    }

    lines.push(String::new());
    lines.push("### Activities".to_string());
    if view.activities.is_empty() {
        lines.push("None reported".to_string());
    }
    for activity in &view.activities {
        let mut text = activity.name.clone();
        if let Some(role) = &activity.role {
            text.push_str(&format!(", {role}"));
        }
        if let Some(category) = &activity.category {
            text.push_str(&format!(" [{category}]"));
        }
        if let Some(hours) = activity.annual_hours {
            text.push_str(&format!(", ~{hours} hours/year"));
        }
        if activity.leadership {
            text.push_str(", leadership");
        }
        if activity.spike {
            text.push_str(", primary focus");
        }
        if let Some(description) = &activity.description {
            text.push_str(&format!(": {description}"));
        }
        lines.push(format!("- {}", with_marker(text, activity.status)));
    }

    lines.push(String::new());
    lines.push("### Awards".to_string());
    if view.awards.is_empty() {
        lines.push("None reported".to_string());
    }
    for award in &view.awards {
        let mut text = format!("{} ({} level)", award.title, award.level.label());
        if let Some(year) = award.year {
            text.push_str(&format!(", {year}"));
        }
        if let Some(description) = &award.description {
            text.push_str(&format!(": {description}"));
        }
        lines.push(format!("- {}", with_marker(text, award.status)));
    }

    if !view.programs.is_empty() {
        lines.push(String::new());
        lines.push("### Summer and enrichment programs".to_string());
        for program in &view.programs {
            let mut text = program.name.clone();
            if let Some(organization) = &program.organization {
                text.push_str(&format!(" ({organization})"));
            }
            if program.is_selective() {
                text.push_str(", selective admission");
            }
            lines.push(format!("- {}", with_marker(text, program.status)));
        }
    }

    if !view.goals.is_empty() {
        lines.push(String::new());
        lines.push("### Goals".to_string());
        for goal in &view.goals {
            let marker = match goal.status {
                GoalStatus::InProgress => "[IN PROGRESS]",
                _ => "[PLANNED]",
            };
            let mut text = format!(
                "{marker} {} ({}/{} tasks done)",
                goal.title, goal.tasks_completed, goal.tasks_total
            );
            if let Some(date) = goal.target_date {
                text.push_str(&format!(", target {date}"));
            }
            lines.push(format!("- {text}"));
        }
    }
}

fn baseline_section(baseline: &QuantitativeResult, lines: &mut Vec<String>) {
    lines.push("## Quantitative baseline".to_string());
    lines.push(format!(
        "Statistical estimate: {}% ({})",
        baseline.base_probability,
        baseline.tier.label()
    ));
    for (name, factor) in [
        ("Academics", &baseline.factors.academics),
        ("Testing", &baseline.factors.testing),
        ("Acceptance rate", &baseline.factors.acceptance_rate),
    ] {
        lines.push(format!(
            "- {name}: {}/100 ({}) {}",
            factor.score,
            factor.impact.label(),
            factor.explanation
        ));
    }
    lines.push(format!(
        "Data confidence: {} ({})",
        baseline.confidence.label(),
        baseline.confidence_reason
    ));
}

/// Probability bands rendered from the shared tier breakpoints.
pub(crate) fn tier_guidelines() -> Vec<String> {
    Tier::ALL
        .iter()
        .map(|tier| {
            let (low, high) = tier.probability_range();
            format!("- {}: {low}-{high}%", tier.label())
        })
        .collect()
}

pub(crate) fn build_prompt(
    snapshot: &ProfileSnapshot,
    school: &ExtendedSchoolData,
    mode: Mode,
    baseline: &QuantitativeResult,
) -> String {
    let view = ModeView::new(snapshot, mode);
    let mut lines = Vec::new();

    school_section(school, &mut lines);
    lines.push(String::new());
    student_section(snapshot, &view, &mut lines);
    lines.push(String::new());
    baseline_section(baseline, &mut lines);

    lines.push(String::new());
    lines.push("## Assessment mode".to_string());
    lines.push(mode_instruction(mode).to_string());

    lines.push(String::new());
    lines.push("## Tier guidelines".to_string());
    lines.extend(tier_guidelines());

    lines.push(String::new());
    lines.push("## Instructions".to_string());
    lines.push(
        "Score academics, testing, activities, and awards from 0 to 100 with an impact label \
         and a one-sentence explanation each."
            .to_string(),
    );
    lines.push(
        "Report a probability between 1 and 95 and the tier that matches it. Use the baseline \
         as an anchor and move away from it only for reasons you can name."
            .to_string(),
    );
    lines.push(
        "Give at most 5 improvements, most valuable first, with a priority and a category."
            .to_string(),
    );

    lines.join("\n")
}
