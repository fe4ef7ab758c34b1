use crate::calc::CalcError;
use crate::config::{self, GradingProfile};
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::retake::CourseGrade;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::error;

pub fn required<T: DeserializeOwned>(req: &Request, key: &str) -> Result<T, serde_json::Value> {
    let Some(raw) = req.params.get(key).filter(|v| !v.is_null()) else {
        return Err(err(&req.id, "bad_params", format!("missing params.{}", key), None));
    };
    serde_json::from_value(raw.clone()).map_err(|e| {
        err(
            &req.id,
            "bad_params",
            format!("params.{}: {}", key, e),
            None,
        )
    })
}

pub fn optional<T: DeserializeOwned>(
    req: &Request,
    key: &str,
) -> Result<Option<T>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(_) => required(req, key).map(Some),
    }
}

pub fn required_f64(req: &Request, key: &str) -> Result<f64, serde_json::Value> {
    let v: f64 = required(req, key)?;
    if !v.is_finite() {
        return Err(err(
            &req.id,
            "bad_params",
            format!("params.{} must be finite", key),
            None,
        ));
    }
    Ok(v)
}

pub fn calc_err(req: &Request, e: CalcError) -> serde_json::Value {
    err(&req.id, &e.code, e.message, e.details)
}

pub fn db_conn<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn profile(state: &AppState, req: &Request) -> Result<GradingProfile, serde_json::Value> {
    config::load_profile(state.db.as_ref()).map_err(|e| {
        error!(error = %e, "failed to load grading profile");
        err(&req.id, "db_query_failed", e.to_string(), None)
    })
}

/// Stored profile with `params.options` applied for this call only.
pub fn call_profile(state: &AppState, req: &Request) -> Result<GradingProfile, serde_json::Value> {
    let stored = profile(state, req)?;
    let merged: GradingProfile = overlay(req, "options", &stored)?;
    merged.validate().map_err(|e| calc_err(req, e))?;
    Ok(merged)
}

/// Overlays the keys of `params.<key>` (an object) onto `base`.
fn overlay<T>(req: &Request, key: &str, base: &T) -> Result<T, serde_json::Value>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = to_json(req, base)?;
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => {}
        Some(serde_json::Value::Object(patch)) => {
            if let Some(obj) = merged.as_object_mut() {
                for (k, v) in patch {
                    obj.insert(k.clone(), v.clone());
                }
            }
        }
        Some(_) => {
            return Err(err(
                &req.id,
                "bad_params",
                format!("params.{} must be an object", key),
                None,
            ))
        }
    }
    serde_json::from_value(merged)
        .map_err(|e| err(&req.id, "bad_params", format!("params.{}: {}", key, e), None))
}

fn to_json<T: Serialize>(req: &Request, v: &T) -> Result<serde_json::Value, serde_json::Value> {
    serde_json::to_value(v).map_err(|e| err(&req.id, "internal", e.to_string(), None))
}

pub fn validate_courses<'a, I>(req: &Request, courses: I) -> Result<(), serde_json::Value>
where
    I: IntoIterator<Item = &'a CourseGrade>,
{
    for (i, c) in courses.into_iter().enumerate() {
        if let Err(e) = c.validate() {
            let details = json!({ "index": i, "courseId": c.course_id });
            return Err(calc_err(req, e.with_details(details)));
        }
    }
    Ok(())
}
