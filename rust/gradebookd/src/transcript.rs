use crate::calc::round_2;
use crate::classify::{get_gpa_classification, GpaClassification};
use crate::gpa::{
    calculate_cumulative_gpa, semester_tally, CgpaOptions, CgpaResult, CreditTally, SemesterData,
};
use crate::grades::GradeOptions;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRow {
    pub semester_id: String,
    pub semester_name: String,
    pub gpa: f64,
    pub credits: f64,
    pub cumulative_gpa: f64,
    pub cumulative_credits: f64,
    pub in_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub rows: Vec<TranscriptRow>,
    pub summary: CgpaResult,
    pub classification: GpaClassification,
}

/// Semester-by-semester view with a running CGPA. Rows follow the same
/// inclusion rules as `calculate_cumulative_gpa`, so the last row's running
/// figures match `summary`.
pub fn build_transcript(
    semesters: &[SemesterData],
    options: &CgpaOptions,
    opts: &GradeOptions,
) -> Transcript {
    let last = semesters.len().saturating_sub(1);
    let mut running = CreditTally::default();
    let mut rows = Vec::with_capacity(semesters.len());

    for (i, semester) in semesters.iter().enumerate() {
        let in_progress = i == last;
        if in_progress && !options.include_current_semester {
            continue;
        }
        let tally = semester_tally(semester, options, opts);
        running.merge(tally);
        rows.push(TranscriptRow {
            semester_id: semester.semester_id.clone(),
            semester_name: semester.semester_name.clone(),
            gpa: round_2(tally.gpa()),
            credits: round_2(tally.credits),
            cumulative_gpa: round_2(running.gpa()),
            cumulative_credits: round_2(running.credits),
            in_progress,
        });
    }

    let summary = calculate_cumulative_gpa(semesters, options, opts);
    Transcript {
        classification: get_gpa_classification(summary.cgpa, options.gpa_scale),
        rows,
        summary,
    }
}
