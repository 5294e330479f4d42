/// SAT equivalents for ACT composites 17 through 36.
const ACT_TO_SAT: [u16; 20] = [
    1020, 1050, 1080, 1110, 1140, 1170, 1200, 1230, 1260, 1290, // 17-26
    1320, 1350, 1380, 1410, 1440, 1470, 1500, 1530, 1560, 1590, // 27-36
];

const TABLE_FLOOR: u16 = 17;
const TABLE_CEILING: u16 = 36;
const SAT_MINIMUM: i32 = 400;
pub(crate) const SAT_MAXIMUM: u16 = 1600;

/// Convert an ACT composite to an SAT-equivalent total.
///
/// Uses the lookup table for 17..=36 and `1000 + (act - 16) * 30` below it.
pub fn act_to_sat(act: u16) -> u16 {
    if act > TABLE_CEILING {
        return ACT_TO_SAT[ACT_TO_SAT.len() - 1];
    }
    if act >= TABLE_FLOOR {
        return ACT_TO_SAT[usize::from(act - TABLE_FLOOR)];
    }
    let extrapolated = 1000 + (i32::from(act) - 16) * 30;
    extrapolated.max(SAT_MINIMUM) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_values_match_reference_points() {
        assert_eq!(act_to_sat(34), 1530);
        assert_eq!(act_to_sat(17), 1020);
        assert_eq!(act_to_sat(36), 1590);
        assert_eq!(act_to_sat(26), 1290);
    }

    #[test]
    fn scores_below_table_extrapolate_linearly() {
        for act in 1..17u16 {
            let expected = (1000 + (i32::from(act) - 16) * 30).max(400) as u16;
            assert_eq!(act_to_sat(act), expected, "act {act}");
        }
        assert_eq!(act_to_sat(16), 1000);
        assert_eq!(act_to_sat(12), 880);
        assert_eq!(act_to_sat(0), 520);
    }

    #[test]
    fn conversion_is_monotonic_and_capped() {
        let mut previous = 0;
        for act in 0..=40u16 {
            let sat = act_to_sat(act);
            assert!(sat >= previous, "conversion dropped at act {act}");
            assert!(sat <= SAT_MAXIMUM);
            previous = sat;
        }
        assert_eq!(act_to_sat(40), 1590);
    }
}
