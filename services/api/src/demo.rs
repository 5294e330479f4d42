use crate::infra::{parse_mode, read_json};
use clap::Args;
use counselor::chances::{
    build_snapshot, calculate_quantitative, ChancesResult, ExtendedSchoolData, HolisticAssessor,
    HttpCompletionClient, Mode, ProfileRecord, ProfileSnapshot, QuantitativeResult,
    SnapshotOptions,
};
use counselor::config::AppConfig;
use counselor::error::AppError;
use counselor::telemetry;
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) const DEMO_PROFILE: &str = "demo-student";

const DEMO_PROFILE_JSON: &str = include_str!("../fixtures/demo_profile.json");
const DEMO_SCHOOLS_JSON: &str = include_str!("../fixtures/demo_schools.json");

pub(crate) fn demo_profile() -> Result<ProfileRecord, AppError> {
    Ok(serde_json::from_str(DEMO_PROFILE_JSON)?)
}

pub(crate) fn demo_schools() -> Result<Vec<ExtendedSchoolData>, AppError> {
    Ok(serde_json::from_str(DEMO_SCHOOLS_JSON)?)
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Print each result as JSON instead of a text summary.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct EstimateArgs {
    /// Path to a profile record (JSON)
    #[arg(long)]
    pub(crate) profile: PathBuf,
    /// Path to a school record (JSON)
    #[arg(long)]
    pub(crate) school: PathBuf,
    /// Print the full result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Path to a profile record (JSON)
    #[arg(long)]
    pub(crate) profile: PathBuf,
    /// Path to a school record (JSON)
    #[arg(long)]
    pub(crate) school: PathBuf,
    /// Which achievements count: current, projected, or simulated
    #[arg(long, default_value = "current", value_parser = parse_mode)]
    pub(crate) mode: Mode,
}

/// Holistic assessment through the configured completion endpoint.
pub(crate) async fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let record: ProfileRecord = read_json(&args.profile)?;
    let school: ExtendedSchoolData = read_json(&args.school)?;
    let snapshot = build_snapshot(&record, SnapshotOptions::default());

    let client = Arc::new(HttpCompletionClient::from_config(&config.llm)?);
    let assessor = HolisticAssessor::new(client);
    match assessor.assess(&snapshot, &school, args.mode).await {
        Ok(result) => {
            render_assessment(&school, &result);
            Ok(())
        }
        Err(err) => {
            eprintln!("Holistic assessment unavailable: {err}");
            let fallback = calculate_quantitative(&snapshot, &school.stats);
            render_estimate(&school, &fallback);
            Ok(())
        }
    }
}

/// Offline statistical estimate for one profile and one school; no completion calls.
pub(crate) fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let record: ProfileRecord = read_json(&args.profile)?;
    let school: ExtendedSchoolData = read_json(&args.school)?;
    let snapshot = build_snapshot(&record, SnapshotOptions::default());
    let result = calculate_quantitative(&snapshot, &school.stats);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render_estimate(&school, &result);
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let record = demo_profile()?;
    let schools = demo_schools()?;
    let snapshot = build_snapshot(&record, SnapshotOptions::default());

    if !args.json {
        render_profile(&snapshot);
    }

    for school in &schools {
        let result = calculate_quantitative(&snapshot, &school.stats);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            render_estimate(school, &result);
        }
    }

    if !args.json {
        println!(
            "\nStatistical estimates only. Start the service and POST /api/chances for a holistic read."
        );
    }
    Ok(())
}

fn render_profile(snapshot: &ProfileSnapshot) {
    println!("Admission chances demo");
    println!("Student: {} ({})", snapshot.name.display(), snapshot.id);
    println!("{}", gpa_line(snapshot));
    println!(
        "Activities: {} ({} leadership) | National awards: {} | Selective programs: {}",
        snapshot.counts.activities,
        snapshot.counts.leadership,
        snapshot.counts.national_awards,
        snapshot.counts.selective_programs
    );
}

/// `normalized_gpa` may come from the weighted GPA or a rescaled one, so the label names the scale.
fn gpa_line(snapshot: &ProfileSnapshot) -> String {
    match snapshot.academics.normalized_gpa() {
        Some(gpa) => format!("GPA (4.0 scale): {gpa:.2}"),
        None => "GPA (4.0 scale): not reported".to_string(),
    }
}

fn render_estimate(school: &ExtendedSchoolData, result: &QuantitativeResult) {
    let location = school
        .location()
        .map(|location| format!(" ({location})"))
        .unwrap_or_default();
    println!("\n{}{}", school.stats.name, location);
    println!(
        "- Base probability: {}% ({}) | confidence {}",
        result.base_probability,
        result.tier.label(),
        result.confidence.label()
    );
    if let Some(ceiling) = result.ceiling {
        println!(
            "- Weighted score {:.1} against a selectivity ceiling of {:.1}",
            result.weighted_score, ceiling
        );
    }
    for (name, factor) in [
        ("Academics", &result.factors.academics),
        ("Testing", &result.factors.testing),
        ("Admit rate", &result.factors.acceptance_rate),
    ] {
        println!(
            "  - {name}: {} ({}) {}",
            factor.score,
            factor.impact.label(),
            factor.explanation
        );
    }
    if !result.missing.is_empty() {
        println!("- {}", result.confidence_reason);
    }
}

fn render_assessment(school: &ExtendedSchoolData, result: &ChancesResult) {
    println!(
        "{}: {}% ({}) | {} mode | confidence {}",
        school.stats.name,
        result.probability,
        result.tier.label(),
        result.mode.label(),
        result.confidence.label()
    );
    println!("{}", result.summary);
    for (name, factor) in [
        ("Academics", &result.factors.academics),
        ("Testing", &result.factors.testing),
        ("Activities", &result.factors.activities),
        ("Awards", &result.factors.awards),
    ] {
        println!("  - {name}: {} ({})", factor.score, factor.impact.label());
    }
    if !result.improvements.is_empty() {
        println!("Improvements");
        for improvement in &result.improvements {
            println!(
                "  {}. [{}] {}",
                improvement.rank,
                improvement.priority.label(),
                improvement.action
            );
        }
    }
}
