use crate::grades::{
    convert_grade, get_all_grade_formats, gpa4_to_gpa5, gpa5_to_gpa4, gpa_to_letter,
    grade_distribution, is_passing, letter_to_percentage, GpaScale, GradeOptions, GradeSystem,
    GradeValue,
};
use crate::ipc::error::{err, ok};
use crate::ipc::params::{call_profile, optional, required, required_f64};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn grade_options(state: &AppState, req: &Request) -> Result<GradeOptions, serde_json::Value> {
    call_profile(state, req).map(|p| p.grade_options())
}

fn handle_formats(state: &mut AppState, req: &Request) -> serde_json::Value {
    let percentage = match required_f64(req, "percentage") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let opts = match grade_options(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, json!(get_all_grade_formats(percentage, &opts)))
}

fn handle_convert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let value: GradeValue = match required(req, "value") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let from: GradeSystem = match required(req, "from") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let to: GradeSystem = match required(req, "to") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let opts = match grade_options(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, json!(convert_grade(&value, from, to, &opts)))
}

fn handle_from_letter(state: &mut AppState, req: &Request) -> serde_json::Value {
    let letter: String = match required(req, "letter") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let opts = match grade_options(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "percentage": letter_to_percentage(&letter, &opts) }),
    )
}

fn handle_gpa_to_letter(state: &mut AppState, req: &Request) -> serde_json::Value {
    let gpa = match required_f64(req, "gpa") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let scale: GpaScale = match required(req, "scale") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let opts = match grade_options(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, json!({ "letter": gpa_to_letter(gpa, scale, &opts) }))
}

fn handle_rescale_gpa(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let gpa = match required_f64(req, "gpa") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let from: GpaScale = match required(req, "from") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (value, scale) = match from {
        GpaScale::Four => (gpa4_to_gpa5(gpa), GpaScale::Five),
        GpaScale::Five => (gpa5_to_gpa4(gpa), GpaScale::Four),
    };
    ok(&req.id, json!({ "gpa": value, "scale": scale }))
}

fn handle_is_passing(state: &mut AppState, req: &Request) -> serde_json::Value {
    let value: GradeValue = match required(req, "value") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let system: GradeSystem = match required(req, "system") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let threshold: Option<f64> = match optional(req, "threshold") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let opts = match grade_options(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "passing": is_passing(&value, system, threshold, &opts),
            "threshold": threshold.unwrap_or_else(|| system.default_pass_threshold()),
        }),
    )
}

fn handle_distribution(state: &mut AppState, req: &Request) -> serde_json::Value {
    let percentages: Vec<f64> = match required(req, "percentages") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if percentages.iter().any(|p| !p.is_finite()) {
        return err(&req.id, "bad_params", "percentages must be finite", None);
    }
    let opts = match grade_options(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "total": percentages.len(),
            "bands": grade_distribution(&percentages, &opts),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.formats" => Some(handle_formats(state, req)),
        "grades.convert" => Some(handle_convert(state, req)),
        "grades.fromLetter" => Some(handle_from_letter(state, req)),
        "grades.gpaToLetter" => Some(handle_gpa_to_letter(state, req)),
        "grades.rescaleGpa" => Some(handle_rescale_gpa(state, req)),
        "grades.isPassing" => Some(handle_is_passing(state, req)),
        "grades.distribution" => Some(handle_distribution(state, req)),
        _ => None,
    }
}
