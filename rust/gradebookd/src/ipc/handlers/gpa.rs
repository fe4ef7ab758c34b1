use crate::classify::{get_gpa_classification, required_gpa_for_target};
use crate::gpa::{calculate_cumulative_gpa, calculate_semester_gpa, CgpaOptions, SemesterData};
use crate::grades::{GpaScale, GradeOptions};
use crate::ipc::error::{err, ok};
use crate::ipc::params::{call_profile, optional, required, required_f64, validate_courses};
use crate::ipc::types::{AppState, Request};
use crate::retake::CourseGrade;
use crate::transcript::build_transcript;
use crate::weighted::ExamTypeWeights;
use serde_json::json;
use tracing::{debug, warn};

struct SemesterInputs {
    semesters: Vec<SemesterData>,
    options: CgpaOptions,
    grade_options: GradeOptions,
}

fn semester_inputs(state: &AppState, req: &Request) -> Result<SemesterInputs, serde_json::Value> {
    let semesters: Vec<SemesterData> = required(req, "semesters")?;
    validate_courses(req, semesters.iter().flat_map(|s| s.courses.iter()))?;
    let profile = call_profile(state, req)?;
    let mut options = profile.cgpa_options();
    options.weights = exam_weights(req)?;
    if options.weights.is_some() {
        warn!("options.weights ignored: course percentages are aggregated as given");
    }
    Ok(SemesterInputs {
        semesters,
        options,
        grade_options: profile.grade_options(),
    })
}

fn exam_weights(req: &Request) -> Result<Option<ExamTypeWeights>, serde_json::Value> {
    let Some(raw) = req
        .params
        .get("options")
        .and_then(|o| o.get("weights"))
        .filter(|v| !v.is_null())
    else {
        return Ok(None);
    };
    serde_json::from_value(raw.clone()).map(Some).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("params.options.weights: {}", e),
            None,
        )
    })
}

fn handle_semester(state: &mut AppState, req: &Request) -> serde_json::Value {
    let courses: Vec<CourseGrade> = match required(req, "courses") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = validate_courses(req, &courses) {
        return e;
    }
    let profile = match call_profile(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let scale = match optional::<GpaScale>(req, "gpaScale") {
        Ok(v) => v.unwrap_or(profile.gpa_scale),
        Err(e) => return e,
    };
    let result = calculate_semester_gpa(&courses, scale, &profile.grade_options());
    ok(&req.id, json!(result))
}

fn handle_cumulative(state: &mut AppState, req: &Request) -> serde_json::Value {
    let inputs = match semester_inputs(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let result = calculate_cumulative_gpa(
        &inputs.semesters,
        &inputs.options,
        &inputs.grade_options,
    );
    debug!(
        semesters = inputs.semesters.len(),
        cgpa = result.cgpa,
        credits = result.total_credits,
        "cumulative gpa"
    );
    ok(&req.id, json!(result))
}

fn handle_transcript(state: &mut AppState, req: &Request) -> serde_json::Value {
    let inputs = match semester_inputs(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let transcript = build_transcript(&inputs.semesters, &inputs.options, &inputs.grade_options);
    ok(&req.id, json!(transcript))
}

fn handle_classify(state: &mut AppState, req: &Request) -> serde_json::Value {
    let gpa = match required_f64(req, "gpa") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let scale = match optional::<GpaScale>(req, "scale") {
        Ok(Some(v)) => v,
        Ok(None) => match call_profile(state, req) {
            Ok(p) => p.gpa_scale,
            Err(e) => return e,
        },
        Err(e) => return e,
    };
    ok(&req.id, json!(get_gpa_classification(gpa, scale)))
}

fn handle_required_for_target(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let mut values = [0.0_f64; 4];
    for (slot, key) in values.iter_mut().zip([
        "currentCgpa",
        "currentCredits",
        "targetCgpa",
        "remainingCredits",
    ]) {
        *slot = match required_f64(req, key) {
            Ok(v) => v,
            Err(e) => return e,
        };
    }
    let [current_cgpa, current_credits, target_cgpa, remaining_credits] = values;
    if remaining_credits <= 0.0 {
        return err(
            &req.id,
            "bad_params",
            "remainingCredits must be positive",
            Some(json!({ "remainingCredits": remaining_credits })),
        );
    }
    let needed = required_gpa_for_target(
        current_cgpa,
        current_credits,
        target_cgpa,
        remaining_credits,
    );
    ok(
        &req.id,
        json!({ "requiredGpa": needed, "achievable": needed.is_some() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "gpa.semester" => Some(handle_semester(state, req)),
        "gpa.cumulative" => Some(handle_cumulative(state, req)),
        "gpa.transcript" => Some(handle_transcript(state, req)),
        "gpa.classify" => Some(handle_classify(state, req)),
        "gpa.requiredForTarget" => Some(handle_required_for_target(state, req)),
        _ => None,
    }
}
