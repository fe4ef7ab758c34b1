use crate::calc::round_2;
use crate::grades::{percentage_to_gpa, GpaScale, GradeOptions};
use crate::retake::{resolve_retakes, CourseGrade, RetakePolicy};
use crate::weighted::ExamTypeWeights;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterData {
    pub semester_id: String,
    pub semester_name: String,
    #[serde(default)]
    pub courses: Vec<CourseGrade>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CgpaOptions {
    pub gpa_scale: GpaScale,
    /// Not read by aggregation. Course percentages are taken as given, so
    /// composite scores must come from `calculate_weighted_score` first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<ExamTypeWeights>,
    pub retake_policy: RetakePolicy,
    pub include_current_semester: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CgpaResult {
    pub cgpa: f64,
    pub total_credits: f64,
    pub total_points: f64,
    #[serde(rename = "semesterGPA", skip_serializing_if = "Option::is_none")]
    pub semester_gpa: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester_credits: Option<f64>,
}

/// Explicit `grade_point` wins over the percentage lookup.
pub fn course_grade_point(course: &CourseGrade, scale: GpaScale, opts: &GradeOptions) -> f64 {
    course
        .grade_point
        .unwrap_or_else(|| percentage_to_gpa(course.percentage, scale, opts))
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CreditTally {
    pub credits: f64,
    pub points: f64,
}

impl CreditTally {
    pub fn add(&mut self, course: &CourseGrade, scale: GpaScale, opts: &GradeOptions) {
        let gp = course_grade_point(course, scale, opts);
        self.credits += course.credit_hours;
        self.points += gp * course.credit_hours;
    }

    pub fn merge(&mut self, other: CreditTally) {
        self.credits += other.credits;
        self.points += other.points;
    }

    pub fn gpa(&self) -> f64 {
        if self.credits > 0.0 {
            self.points / self.credits
        } else {
            0.0
        }
    }
}

pub fn calculate_semester_gpa(
    courses: &[CourseGrade],
    scale: GpaScale,
    opts: &GradeOptions,
) -> CgpaResult {
    let mut tally = CreditTally::default();
    for c in courses {
        tally.add(c, scale, opts);
    }
    CgpaResult {
        cgpa: round_2(tally.gpa()),
        total_credits: round_2(tally.credits),
        total_points: round_2(tally.points),
        semester_gpa: None,
        semester_credits: None,
    }
}

/// Resolved (retakes collapsed) credit tally for one semester.
pub(crate) fn semester_tally(
    semester: &SemesterData,
    options: &CgpaOptions,
    opts: &GradeOptions,
) -> CreditTally {
    let mut tally = CreditTally::default();
    for c in resolve_retakes(&semester.courses, options.retake_policy) {
        tally.add(&c, options.gpa_scale, opts);
    }
    tally
}

/// The last semester is the in-progress one. It counts toward totals only
/// when `include_current_semester` is set, and then also gets its own GPA.
pub fn calculate_cumulative_gpa(
    semesters: &[SemesterData],
    options: &CgpaOptions,
    opts: &GradeOptions,
) -> CgpaResult {
    let Some(current_idx) = semesters.len().checked_sub(1) else {
        return CgpaResult::default();
    };

    let mut total = CreditTally::default();
    let mut current = CreditTally::default();
    for (i, semester) in semesters.iter().enumerate() {
        let is_current = i == current_idx;
        if is_current && !options.include_current_semester {
            continue;
        }
        let tally = semester_tally(semester, options, opts);
        total.merge(tally);
        if is_current {
            current.merge(tally);
        }
    }

    let (semester_gpa, semester_credits) =
        if options.include_current_semester && current.credits > 0.0 {
            (Some(round_2(current.gpa())), Some(round_2(current.credits)))
        } else {
            (None, None)
        };

    CgpaResult {
        cgpa: round_2(total.gpa()),
        total_credits: round_2(total.credits),
        total_points: round_2(total.points),
        semester_gpa,
        semester_credits,
    }
}
