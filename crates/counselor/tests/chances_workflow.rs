use counselor::chances::{
    act_to_sat, build_snapshot, calculate_quantitative, probability_from_decimal,
    probability_to_decimal, Confidence, ExtendedSchoolData, Impact, Mode, ProfileRecord,
    SnapshotOptions, Tier, MAX_PROBABILITY, MIN_PROBABILITY,
};
use serde_json::json;

fn profile(academics: serde_json::Value, tests: serde_json::Value) -> ProfileRecord {
    serde_json::from_value(json!({
        "id": "integration-student",
        "firstName": "Jordan",
        "lastName": "Lee",
        "academics": academics,
        "testScores": tests,
        "activities": [
            { "name": "Student Government", "role": "President" },
            { "name": "Science Olympiad", "status": "in_progress" }
        ]
    }))
    .expect("profile fixture")
}

fn school(value: serde_json::Value) -> ExtendedSchoolData {
    serde_json::from_value(value).expect("school fixture")
}

#[test]
fn perfect_profile_is_capped_by_a_four_percent_admit_rate() {
    let record = profile(
        json!({ "gpaUnweighted": 4.0 }),
        json!([{ "kind": "sat", "total": 1550 }]),
    );
    let snapshot = build_snapshot(&record, SnapshotOptions::default());
    let target = school(json!({
        "id": "elite",
        "name": "Elite Institute",
        "acceptanceRate": 0.04,
        "satRange": { "p25": 1500, "p75": 1570 }
    }));

    let result = calculate_quantitative(&snapshot, &target.stats);

    assert!(result.factors.academics.score >= 85);
    assert_eq!(result.factors.academics.impact, Impact::StrongPositive);
    assert!(result.factors.testing.score >= 85);
    assert_eq!(result.factors.testing.impact, Impact::StrongPositive);
    assert!(result.factors.acceptance_rate.score <= 20);
    assert!(result.base_probability <= 10);
    assert_eq!(result.tier, Tier::from_probability(result.base_probability));
}

#[test]
fn empty_profile_against_unknown_school_is_neutral() {
    let record = profile(json!(null), json!([]));
    let snapshot = build_snapshot(&record, SnapshotOptions::default());
    let target = school(json!({ "id": "unknown", "name": "Unknown College" }));

    let result = calculate_quantitative(&snapshot, &target.stats);

    assert_eq!(result.factors.academics.score, 50);
    assert_eq!(result.factors.testing.score, 50);
    assert_eq!(result.factors.acceptance_rate.score, 50);
    assert_eq!(result.confidence, Confidence::Low);
    assert_eq!(result.base_probability, 50);
}

#[test]
fn snapshot_counts_ignore_unfinished_work_but_keep_it_for_later_modes() {
    let record = profile(json!({ "gpaUnweighted": 3.7 }), json!([]));
    let snapshot = build_snapshot(&record, SnapshotOptions::default());

    assert_eq!(snapshot.counts.activities, 1);
    assert_eq!(snapshot.counts.leadership, 1);
    assert_eq!(snapshot.activities.len(), 2);
    assert!(Mode::Projected.includes(snapshot.activities[1].status));
    assert!(!Mode::Current.includes(snapshot.activities[1].status));
}

#[test]
fn cached_decimal_recovers_every_reportable_probability() {
    for probability in MIN_PROBABILITY..=MAX_PROBABILITY {
        assert_eq!(
            probability_from_decimal(probability_to_decimal(probability)),
            Some(probability)
        );
    }
}

#[test]
fn act_conversion_follows_the_concordance_table() {
    assert_eq!(act_to_sat(36), 1590);
    assert_eq!(act_to_sat(34), 1530);
    assert_eq!(act_to_sat(17), 1020);
    assert_eq!(act_to_sat(40), 1590);
    assert_eq!(act_to_sat(12), 880);
}
