use crate::calc::round_2;
use crate::grades::GpaScale;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpaClassification {
    pub classification: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latin_honors: Option<&'static str>,
}

const LADDER: [(&str, Option<&str>); 6] = [
    ("First Class", Some("Summa Cum Laude")),
    ("First Class", Some("Magna Cum Laude")),
    ("First Class", Some("Cum Laude")),
    ("Second Upper", None),
    ("Second Lower", None),
    ("Third Class", None),
];

const THRESHOLDS_4: [f64; 6] = [3.9, 3.7, 3.5, 3.0, 2.5, 2.0];
const THRESHOLDS_5: [f64; 6] = [4.5, 4.0, 3.5, 3.0, 2.5, 2.0];

const BELOW_STANDARD: &str = "Below Standard";

/// Projection ceiling. Fixed at the 4-point maximum whatever scale the
/// caller grades on.
pub const TARGET_GPA_CEILING: f64 = 4.0;

pub fn get_gpa_classification(gpa: f64, scale: GpaScale) -> GpaClassification {
    let thresholds = match scale {
        GpaScale::Four => &THRESHOLDS_4,
        GpaScale::Five => &THRESHOLDS_5,
    };
    for (min, (classification, latin_honors)) in thresholds.iter().zip(LADDER) {
        if gpa >= *min {
            return GpaClassification {
                classification,
                latin_honors,
            };
        }
    }
    GpaClassification {
        classification: BELOW_STANDARD,
        latin_honors: None,
    }
}

/// GPA needed over `remaining_credits` to finish at `target_cgpa`.
/// `None` when that exceeds the ceiling, 0 when the target is already met.
///
/// `remaining_credits` must be positive; a zero yields a non-finite quotient.
pub fn required_gpa_for_target(
    current_cgpa: f64,
    current_credits: f64,
    target_cgpa: f64,
    remaining_credits: f64,
) -> Option<f64> {
    let needed = (target_cgpa * (current_credits + remaining_credits)
        - current_cgpa * current_credits)
        / remaining_credits;
    if needed > TARGET_GPA_CEILING {
        return None;
    }
    if needed < 0.0 {
        return Some(0.0);
    }
    Some(round_2(needed))
}
