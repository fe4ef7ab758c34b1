use crate::grades::percentage_to_letter;
use crate::ipc::error::{err, ok};
use crate::ipc::params::{call_profile, optional, required, required_f64, validate_courses};
use crate::ipc::types::{AppState, Request};
use crate::retake::{
    apply_retake_penalty, derive_attempts, effective_attempt_score, resolve_retakes, CourseGrade,
    RawAttempt, RetakePolicy,
};
use crate::weighted::{calculate_weighted_score, ExamScore, ExamTypeWeights};
use serde_json::json;

fn non_negative_penalty(req: &Request, penalty: f64) -> Result<f64, serde_json::Value> {
    if !penalty.is_finite() || penalty < 0.0 {
        return Err(err(
            &req.id,
            "bad_params",
            "penaltyPercent must be a non-negative number",
            None,
        ));
    }
    Ok(penalty)
}

fn handle_weighted(state: &mut AppState, req: &Request) -> serde_json::Value {
    let scores: Vec<ExamScore> = match required(req, "scores") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let weights: ExamTypeWeights = match required(req, "weights") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let profile = match call_profile(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let percentage = calculate_weighted_score(&scores, &weights);
    ok(
        &req.id,
        json!({
            "percentage": percentage,
            "letter": percentage_to_letter(percentage, &profile.grade_options()),
        }),
    )
}

fn handle_penalty(state: &mut AppState, req: &Request) -> serde_json::Value {
    let percentage = match required_f64(req, "percentage") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let attempt_number: u32 = match required(req, "attemptNumber") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let penalty = match optional::<f64>(req, "penaltyPercent") {
        Ok(Some(v)) => v,
        Ok(None) => match call_profile(state, req) {
            Ok(p) => p.retake_penalty_percent,
            Err(e) => return e,
        },
        Err(e) => return e,
    };
    let penalty = match non_negative_penalty(req, penalty) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "percentage": apply_retake_penalty(percentage, attempt_number, penalty) }),
    )
}

fn handle_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let courses: Vec<CourseGrade> = match required(req, "courses") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = validate_courses(req, &courses) {
        return e;
    }
    let policy = match optional::<RetakePolicy>(req, "policy") {
        Ok(Some(v)) => v,
        Ok(None) => match call_profile(state, req) {
            Ok(p) => p.retake_policy,
            Err(e) => return e,
        },
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({ "policy": policy, "courses": resolve_retakes(&courses, policy) }),
    )
}

fn handle_attempts(state: &mut AppState, req: &Request) -> serde_json::Value {
    let raw: Vec<RawAttempt> = match required(req, "attempts") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if raw.iter().any(|a| a.score.map(|s| !s.is_finite()).unwrap_or(false)) {
        return err(&req.id, "bad_params", "attempt scores must be finite", None);
    }
    let profile = match call_profile(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let penalty = match optional::<f64>(req, "penaltyPercent") {
        Ok(v) => v.unwrap_or(profile.retake_penalty_percent),
        Err(e) => return e,
    };
    let penalty = match non_negative_penalty(req, penalty) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let policy = match optional::<RetakePolicy>(req, "policy") {
        Ok(v) => v.unwrap_or(profile.retake_policy),
        Err(e) => return e,
    };

    let attempts = derive_attempts(&raw, penalty);
    ok(
        &req.id,
        json!({
            "attempts": attempts,
            "policy": policy,
            "effectiveScore": effective_attempt_score(&attempts, policy),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "scores.weighted" => Some(handle_weighted(state, req)),
        "retake.penalty" => Some(handle_penalty(state, req)),
        "retake.resolve" => Some(handle_resolve(state, req)),
        "retake.attempts" => Some(handle_attempts(state, req)),
        _ => None,
    }
}
