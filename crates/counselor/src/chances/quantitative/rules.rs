use super::conversion::{act_to_sat, SAT_MAXIMUM};
use crate::chances::domain::{FactorAssessment, Impact};
use crate::chances::school::{Benchmark, ScoreRange, SchoolData};
use crate::chances::snapshot::ProfileSnapshot;

/// Distance from a school's average GPA counted as one tolerance unit.
const AVERAGE_GPA_TOLERANCE: f64 = 0.15;
/// Smallest half-width used for a school test band; keeps degenerate bands finite.
const MIN_BAND_HALF_WIDTH: f64 = 10.0;

/// Map a signed distance (in tolerance units) onto a 20..=100 score.
///
/// At or above the reference the score saturates between 85 and 100; the reference
/// minus one tolerance lands on 65 and the curve floors at 20.
pub(crate) fn position_score(z: f64) -> f64 {
    if !z.is_finite() {
        return f64::from(FactorAssessment::NEUTRAL_SCORE);
    }
    if z >= 0.0 {
        85.0 + z.min(1.5) * 10.0
    } else if z >= -1.0 {
        65.0 + (z + 1.0) * 20.0
    } else if z >= -3.0 {
        40.0 + (z + 3.0) * 12.5
    } else {
        (40.0 + (z + 3.0) * 5.0).max(20.0)
    }
}

pub(crate) fn to_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

pub(crate) fn known_acceptance_rate(school: &SchoolData) -> Option<f64> {
    school.known_acceptance_rate()
}

/// Points added to the academics score for class rank; stays within ±10.
fn rank_adjustment(percentile: f64) -> f64 {
    if percentile >= 95.0 {
        10.0
    } else if percentile >= 90.0 {
        5.0
    } else if percentile >= 75.0 {
        0.0
    } else if percentile >= 50.0 {
        -5.0
    } else {
        -10.0
    }
}

pub(crate) fn academics_factor(snapshot: &ProfileSnapshot, school: &SchoolData) -> FactorAssessment {
    let Some(gpa) = snapshot.academics.normalized_gpa() else {
        return FactorAssessment::neutral("No GPA on file; academics treated as neutral");
    };

    let (z, mut explanation) = match school.average_gpa.filter(|avg| avg.is_finite() && *avg > 0.0) {
        Some(average) => {
            let z = (gpa - average) / AVERAGE_GPA_TOLERANCE;
            let relation = if gpa >= average { "at or above" } else { "below" };
            (
                z,
                format!("GPA {gpa:.2} is {relation} the school average of {average:.2}"),
            )
        }
        None => {
            let selectivity = school.selectivity();
            let Benchmark { target, tolerance } = selectivity.gpa_benchmark();
            let z = (gpa - target) / tolerance;
            (
                z,
                format!(
                    "GPA {gpa:.2} against a typical {target:.2} at {} schools",
                    selectivity.label()
                ),
            )
        }
    };

    let mut raw = position_score(z);
    if let Some(percentile) = snapshot.academics.percentile {
        let adjustment = rank_adjustment(percentile);
        raw += adjustment;
        explanation.push_str(&format!(
            "; class rank places the student above {percentile:.0}% of peers"
        ));
    }

    FactorAssessment::scored(to_score(raw), explanation)
}

/// Best admission test expressed on the SAT scale, with a label naming its origin.
fn sat_equivalent(snapshot: &ProfileSnapshot) -> Option<(u16, String)> {
    let sat = snapshot
        .testing
        .sat
        .map(|sat| (sat.total.min(SAT_MAXIMUM), format!("SAT {}", sat.total)));
    let act = snapshot.testing.act.map(|act| {
        let converted = act_to_sat(act.composite);
        (converted, format!("ACT {} (~{converted} SAT)", act.composite))
    });

    match (sat, act) {
        (Some(sat), Some(act)) => Some(if act.0 > sat.0 { act } else { sat }),
        (sat, act) => sat.or(act),
    }
}

/// School band on the SAT scale; an ACT-only band is converted point by point.
fn sat_band(school: &SchoolData) -> Option<ScoreRange> {
    school.sat_range.or_else(|| {
        school.act_range.map(|range| ScoreRange {
            p25: act_to_sat(range.p25),
            p75: act_to_sat(range.p75),
        })
    })
}

pub(crate) fn testing_factor(snapshot: &ProfileSnapshot, school: &SchoolData) -> FactorAssessment {
    let Some((score, label)) = sat_equivalent(snapshot) else {
        return FactorAssessment::neutral("No SAT or ACT on file; testing treated as neutral");
    };
    let score_f = f64::from(score);

    let (z, explanation) = match sat_band(school) {
        Some(band) => {
            let z = (score_f - band.midpoint()) / band.half_width().max(MIN_BAND_HALF_WIDTH);
            let position = if score >= band.p75 {
                "at or above the 75th percentile"
            } else if score >= band.p25 {
                "within the middle 50%"
            } else {
                "below the 25th percentile"
            };
            (
                z,
                format!(
                    "{label} is {position} of admitted students ({}-{})",
                    band.p25, band.p75
                ),
            )
        }
        None => {
            let selectivity = school.selectivity();
            let Benchmark { target, tolerance } = selectivity.sat_benchmark();
            (
                (score_f - target) / tolerance,
                format!(
                    "{label} against a typical {target:.0} at {} schools",
                    selectivity.label()
                ),
            )
        }
    };

    FactorAssessment::scored(to_score(position_score(z)), explanation)
}

/// Prior from the raw admit rate; more selective schools score lower.
pub(crate) fn acceptance_rate_factor(school: &SchoolData) -> FactorAssessment {
    let Some(rate) = known_acceptance_rate(school) else {
        return FactorAssessment::neutral("Acceptance rate unknown; prior treated as neutral");
    };

    let (score, impact) = if rate < 0.10 {
        (10, Impact::StrongNegative)
    } else if rate < 0.25 {
        (30, Impact::Negative)
    } else if rate < 0.50 {
        (50, Impact::Neutral)
    } else if rate < 0.75 {
        (70, Impact::Positive)
    } else {
        (90, Impact::StrongPositive)
    };

    FactorAssessment {
        score,
        impact,
        explanation: format!("Admits {:.1}% of applicants", rate * 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_curve_is_continuous_at_breakpoints() {
        assert!((position_score(0.0) - 85.0).abs() < 1e-9);
        assert!((position_score(-1.0) - 65.0).abs() < 1e-9);
        assert!((position_score(-3.0) - 40.0).abs() < 1e-9);
        assert!((position_score(1.5) - 100.0).abs() < 1e-9);
        assert!((position_score(9.0) - 100.0).abs() < 1e-9);
        assert!((position_score(-50.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn rank_adjustment_steps_by_percentile() {
        assert_eq!(rank_adjustment(99.3), 10.0);
        assert_eq!(rank_adjustment(95.0), 10.0);
        assert_eq!(rank_adjustment(92.0), 5.0);
        assert_eq!(rank_adjustment(80.0), 0.0);
        assert_eq!(rank_adjustment(60.0), -5.0);
        assert_eq!(rank_adjustment(10.0), -10.0);
    }

    #[test]
    fn position_curve_is_monotonic() {
        let mut previous = position_score(-10.0);
        let mut z = -10.0;
        while z <= 3.0 {
            let score = position_score(z);
            assert!(score >= previous, "curve dropped at z={z}");
            previous = score;
            z += 0.05;
        }
    }

    #[test]
    fn rank_adjustment_is_bounded() {
        assert_eq!(rank_adjustment(99.0), 10.0);
        assert_eq!(rank_adjustment(91.0), 5.0);
        assert_eq!(rank_adjustment(80.0), 0.0);
        assert_eq!(rank_adjustment(60.0), -5.0);
        assert_eq!(rank_adjustment(5.0), -10.0);
    }
}
