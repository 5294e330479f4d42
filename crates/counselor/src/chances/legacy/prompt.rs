use crate::chances::domain::Mode;
use crate::chances::quantitative::QuantitativeResult;
use crate::chances::school::ExtendedSchoolData;
use crate::chances::snapshot::ProfileSnapshot;

pub(crate) const SYSTEM_PROMPT: &str = "\
You are a college admissions reader. Academic and testing factors have already been scored \
statistically. Assess only the qualitative factors and reply with a single JSON object.";

pub(crate) fn build_prompt(
    snapshot: &ProfileSnapshot,
    school: &ExtendedSchoolData,
    quantitative: &QuantitativeResult,
    mode: Mode,
) -> String {
    let mut lines = vec![
        format!("School: {}", school.stats.name),
        format!(
            "Selectivity: {}",
            school.stats.selectivity().label()
        ),
        format!(
            "Statistical baseline: {}% ({})",
            quantitative.base_probability,
            quantitative.tier.label()
        ),
        String::new(),
        "Activities:".to_string(),
    ];

    let activities: Vec<_> = snapshot
        .activities
        .iter()
        .filter(|item| mode.includes(item.status))
        .collect();
    if activities.is_empty() {
        lines.push("- none".to_string());
    }
    for activity in activities {
        let mut line = format!("- {}", activity.name);
        if let Some(role) = &activity.role {
            line.push_str(&format!(" ({role})"));
        }
        if activity.leadership {
            line.push_str(" [leadership]");
        }
        if let Some(marker) = activity.status.marker() {
            line.push_str(&format!(" {marker}"));
        }
        lines.push(line);
    }

    lines.push(String::new());
    lines.push("Awards:".to_string());
    let awards: Vec<_> = snapshot
        .awards
        .iter()
        .filter(|item| mode.includes(item.status))
        .collect();
    if awards.is_empty() {
        lines.push("- none".to_string());
    }
    for award in awards {
        let mut line = format!("- {} ({})", award.title, award.level.label());
        if let Some(marker) = award.status.marker() {
            line.push_str(&format!(" {marker}"));
        }
        lines.push(line);
    }

    lines.push(String::new());
    lines.push(
        "Return JSON with keys: factors.activities and factors.awards (each {score 0-100, \
         impact, explanation}), adjustment (integer from -20 to 20 applied to the baseline), \
         summary, improvements (up to 5 of {action, priority, category})."
            .to_string(),
    );

    lines.join("\n")
}
