use crate::config::{self, GradingProfile};
use crate::ipc::error::{err, ok};
use crate::ipc::params::{calc_err, db_conn, profile};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use tracing::{info, warn};

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let profile = match profile(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, json!(profile))
}

fn handle_config_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let current = match config::load_profile(Some(conn)) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "stored grading profile unreadable, updating from defaults");
            GradingProfile::default()
        }
    };

    let next = match current.merged(&req.params) {
        Ok(v) => v,
        Err(e) => return calc_err(req, e),
    };

    if let Err(e) = config::save_profile(conn, &next) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    info!(
        bands = next.boundaries.len(),
        rounding = ?next.rounding_method,
        decimal_places = next.decimal_places,
        "grading profile updated"
    );
    ok(&req.id, json!(next))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "calc.config.get" => Some(handle_config_get(state, req)),
        "calc.config.update" => Some(handle_config_update(state, req)),
        _ => None,
    }
}
