use crate::calc::{CalcError, RoundingMethod};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// One inclusive band of a grading scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBoundary {
    pub grade: String,
    pub min_score: f64,
    pub max_score: f64,
    pub gpa4: f64,
    pub gpa5: f64,
}

// grade, min, max, gpa4, gpa5 (highest band first)
const DEFAULT_BANDS: [(&str, f64, f64, f64, f64); 13] = [
    ("A+", 97.0, 100.0, 4.0, 5.0),
    ("A", 93.0, 96.99, 4.0, 4.75),
    ("A-", 90.0, 92.99, 3.7, 4.5),
    ("B+", 87.0, 89.99, 3.3, 4.25),
    ("B", 83.0, 86.99, 3.0, 4.0),
    ("B-", 80.0, 82.99, 2.7, 3.75),
    ("C+", 77.0, 79.99, 2.3, 3.5),
    ("C", 73.0, 76.99, 2.0, 3.25),
    ("C-", 70.0, 72.99, 1.7, 3.0),
    ("D+", 67.0, 69.99, 1.3, 2.75),
    ("D", 63.0, 66.99, 1.0, 2.5),
    ("D-", 60.0, 62.99, 0.7, 2.25),
    ("F", 0.0, 59.99, 0.0, 0.0),
];

pub const FALLBACK_LETTER: &str = "F";

pub fn default_boundaries() -> Vec<ScoreBoundary> {
    DEFAULT_BANDS
        .iter()
        .map(|&(grade, min_score, max_score, gpa4, gpa5)| ScoreBoundary {
            grade: grade.to_string(),
            min_score,
            max_score,
            gpa4,
            gpa5,
        })
        .collect()
}

/// Lookup configuration for percentage-driven conversions. Institutions
/// override `boundaries` to install their own scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradeOptions {
    pub boundaries: Vec<ScoreBoundary>,
    pub rounding_method: RoundingMethod,
    pub decimal_places: u32,
}

impl Default for GradeOptions {
    fn default() -> Self {
        Self {
            boundaries: default_boundaries(),
            rounding_method: RoundingMethod::Round,
            decimal_places: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GpaScale {
    #[default]
    Four,
    Five,
}

impl GpaScale {
    pub fn max(self) -> f64 {
        match self {
            GpaScale::Four => 4.0,
            GpaScale::Five => 5.0,
        }
    }

    fn pick(self, b: &ScoreBoundary) -> f64 {
        match self {
            GpaScale::Four => b.gpa4,
            GpaScale::Five => b.gpa5,
        }
    }
}

impl TryFrom<u8> for GpaScale {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            4 => Ok(GpaScale::Four),
            5 => Ok(GpaScale::Five),
            other => Err(format!("gpa scale must be 4 or 5, got {}", other)),
        }
    }
}

impl From<GpaScale> for u8 {
    fn from(s: GpaScale) -> u8 {
        match s {
            GpaScale::Four => 4,
            GpaScale::Five => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeSystem {
    #[serde(rename = "PERCENTAGE")]
    Percentage,
    #[serde(rename = "GPA_4")]
    Gpa4,
    #[serde(rename = "GPA_5")]
    Gpa5,
    #[serde(rename = "LETTER")]
    Letter,
    #[serde(rename = "CGPA")]
    Cgpa,
    #[serde(rename = "CCE")]
    Cce,
    #[serde(rename = "CBSE")]
    Cbse,
    #[serde(rename = "ICSE")]
    Icse,
    #[serde(other)]
    Other,
}

impl GradeSystem {
    pub fn default_pass_threshold(self) -> f64 {
        match self {
            GradeSystem::Percentage | GradeSystem::Letter | GradeSystem::Other => 60.0,
            GradeSystem::Gpa4 | GradeSystem::Cgpa => 2.0,
            GradeSystem::Gpa5 => 2.5,
            GradeSystem::Cce => 40.0,
            GradeSystem::Cbse => 33.0,
            GradeSystem::Icse => 35.0,
        }
    }
}

/// A grade as callers hand it over: numeric, or a letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GradeValue {
    Number(f64),
    Letter(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedGrade {
    pub value: GradeValue,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeFormats {
    pub percentage: f64,
    pub gpa4: f64,
    pub gpa5: f64,
    pub letter: String,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeCount {
    pub grade: String,
    pub count: usize,
}

fn find_boundary(percentage: f64, opts: &GradeOptions) -> Option<&ScoreBoundary> {
    let rounded = opts.rounding_method.apply(percentage, opts.decimal_places);
    opts.boundaries
        .iter()
        .find(|b| rounded >= b.min_score && rounded <= b.max_score)
}

pub fn percentage_to_letter(percentage: f64, opts: &GradeOptions) -> String {
    find_boundary(percentage, opts)
        .map(|b| b.grade.clone())
        .unwrap_or_else(|| FALLBACK_LETTER.to_string())
}

pub fn percentage_to_gpa(percentage: f64, scale: GpaScale, opts: &GradeOptions) -> f64 {
    find_boundary(percentage, opts)
        .map(|b| scale.pick(b))
        .unwrap_or(0.0)
}

pub fn percentage_to_gpa4(percentage: f64, opts: &GradeOptions) -> f64 {
    percentage_to_gpa(percentage, GpaScale::Four, opts)
}

pub fn percentage_to_gpa5(percentage: f64, opts: &GradeOptions) -> f64 {
    percentage_to_gpa(percentage, GpaScale::Five, opts)
}

/// Approximate inverse of the GPA lookup: the band whose GPA on `scale`
/// is nearest to `gpa`. Ties go to the band listed first. Non-finite input
/// gets the fallback letter.
pub fn gpa_to_letter(gpa: f64, scale: GpaScale, opts: &GradeOptions) -> String {
    if !gpa.is_finite() {
        return FALLBACK_LETTER.to_string();
    }
    let mut best: Option<(&ScoreBoundary, f64)> = None;
    for b in &opts.boundaries {
        let diff = (scale.pick(b) - gpa).abs();
        match best {
            Some((_, d)) if diff >= d => {}
            _ => best = Some((b, diff)),
        }
    }
    best.map(|(b, _)| b.grade.clone())
        .unwrap_or_else(|| FALLBACK_LETTER.to_string())
}

pub fn gpa4_to_gpa5(gpa4: f64) -> f64 {
    (gpa4 * 1.25).min(5.0)
}

pub fn gpa5_to_gpa4(gpa5: f64) -> f64 {
    (gpa5 * 0.8).min(4.0)
}

/// Band midpoint for a letter (case-insensitive), or 0 when the table has no such grade.
pub fn letter_to_percentage(letter: &str, opts: &GradeOptions) -> f64 {
    opts.boundaries
        .iter()
        .find(|b| b.grade.eq_ignore_ascii_case(letter))
        .map(|b| (b.min_score + b.max_score) / 2.0)
        .unwrap_or(0.0)
}

fn to_percentage(value: &GradeValue, from: GradeSystem, opts: &GradeOptions) -> f64 {
    match value {
        GradeValue::Letter(letter) => letter_to_percentage(letter, opts),
        GradeValue::Number(n) => match from {
            GradeSystem::Gpa4 => n / GpaScale::Four.max() * 100.0,
            GradeSystem::Gpa5 => n / GpaScale::Five.max() * 100.0,
            _ => *n,
        },
    }
}

pub fn convert_grade(
    value: &GradeValue,
    from: GradeSystem,
    to: GradeSystem,
    opts: &GradeOptions,
) -> ConvertedGrade {
    let percentage = to_percentage(value, from, opts);
    match to {
        GradeSystem::Gpa4 => {
            let gpa = percentage_to_gpa4(percentage, opts);
            ConvertedGrade {
                value: GradeValue::Number(gpa),
                display: format!("{:.2}", gpa),
            }
        }
        GradeSystem::Gpa5 => {
            let gpa = percentage_to_gpa5(percentage, opts);
            ConvertedGrade {
                value: GradeValue::Number(gpa),
                display: format!("{:.2}", gpa),
            }
        }
        GradeSystem::Letter => {
            let letter = percentage_to_letter(percentage, opts);
            ConvertedGrade {
                display: letter.clone(),
                value: GradeValue::Letter(letter),
            }
        }
        _ => ConvertedGrade {
            value: GradeValue::Number(percentage),
            display: format!("{:.2}%", percentage),
        },
    }
}

pub fn get_all_grade_formats(percentage: f64, opts: &GradeOptions) -> GradeFormats {
    GradeFormats {
        percentage,
        gpa4: percentage_to_gpa4(percentage, opts),
        gpa5: percentage_to_gpa5(percentage, opts),
        letter: percentage_to_letter(percentage, opts),
        passed: percentage >= GradeSystem::Percentage.default_pass_threshold(),
    }
}

/// Letter values are compared as their band midpoint whatever `system` says.
pub fn is_passing(
    value: &GradeValue,
    system: GradeSystem,
    threshold: Option<f64>,
    opts: &GradeOptions,
) -> bool {
    let threshold = threshold.unwrap_or_else(|| system.default_pass_threshold());
    let numeric = match value {
        GradeValue::Number(n) => *n,
        GradeValue::Letter(letter) => letter_to_percentage(letter, opts),
    };
    numeric >= threshold
}

/// Checks the ordering and contiguity contract of a boundary table at the
/// given display precision.
pub fn validate_boundaries(
    boundaries: &[ScoreBoundary],
    decimal_places: u32,
) -> Result<(), CalcError> {
    let Some(first) = boundaries.first() else {
        return Err(CalcError::invalid_argument("boundary table is empty"));
    };
    let step = 10_f64.powi(-(decimal_places as i32));
    let eps = step / 1000.0;

    for (i, b) in boundaries.iter().enumerate() {
        let bad_range = !b.min_score.is_finite()
            || !b.max_score.is_finite()
            || b.min_score > b.max_score
            || b.min_score < 0.0
            || b.max_score > 100.0;
        if bad_range {
            return Err(
                CalcError::invalid_argument(format!("band {} has an invalid range", b.grade))
                    .with_details(json!({ "index": i })),
            );
        }
    }

    if first.max_score < 100.0 {
        return Err(CalcError::invalid_argument("highest band must reach 100"));
    }
    if boundaries.last().map(|b| b.min_score > 0.0).unwrap_or(true) {
        return Err(CalcError::invalid_argument("lowest band must reach 0"));
    }

    for (i, pair) in boundaries.windows(2).enumerate() {
        let (upper, lower) = (&pair[0], &pair[1]);
        if lower.min_score >= upper.min_score {
            return Err(CalcError::invalid_argument(format!(
                "bands must be ordered by descending minScore ({} before {})",
                upper.grade, lower.grade
            ))
            .with_details(json!({ "index": i + 1 })));
        }
        let gap = upper.min_score - lower.max_score;
        if gap <= 0.0 {
            return Err(CalcError::invalid_argument(format!(
                "bands {} and {} overlap",
                upper.grade, lower.grade
            ))
            .with_details(json!({ "index": i + 1 })));
        }
        if gap > step + eps {
            return Err(CalcError::invalid_argument(format!(
                "gap between bands {} and {}",
                upper.grade, lower.grade
            ))
            .with_details(json!({ "index": i + 1, "gap": gap })));
        }
    }
    Ok(())
}

/// Per-band counts in table order, zero counts included.
pub fn grade_distribution(percentages: &[f64], opts: &GradeOptions) -> Vec<GradeCount> {
    let mut out: Vec<GradeCount> = opts
        .boundaries
        .iter()
        .map(|b| GradeCount {
            grade: b.grade.clone(),
            count: 0,
        })
        .collect();
    for &p in percentages {
        let letter = percentage_to_letter(p, opts);
        match out.iter_mut().find(|c| c.grade == letter) {
            Some(c) => c.count += 1,
            None => out.push(GradeCount {
                grade: letter,
                count: 1,
            }),
        }
    }
    out
}
