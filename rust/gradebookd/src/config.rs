use crate::calc::{CalcError, RoundingMethod};
use crate::db;
use crate::gpa::CgpaOptions;
use crate::grades::{default_boundaries, validate_boundaries, GpaScale, GradeOptions, ScoreBoundary};
use crate::retake::RetakePolicy;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const PROFILE_KEY: &str = "grading.profile";

const MAX_DECIMAL_PLACES: u32 = 6;

/// Workspace-wide grading defaults. Requests may still override any of
/// these per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GradingProfile {
    pub boundaries: Vec<ScoreBoundary>,
    pub rounding_method: RoundingMethod,
    pub decimal_places: u32,
    pub gpa_scale: GpaScale,
    pub retake_policy: RetakePolicy,
    pub retake_penalty_percent: f64,
    pub include_current_semester: bool,
}

impl Default for GradingProfile {
    fn default() -> Self {
        Self {
            boundaries: default_boundaries(),
            rounding_method: RoundingMethod::Round,
            decimal_places: 2,
            gpa_scale: GpaScale::Four,
            retake_policy: RetakePolicy::Best,
            retake_penalty_percent: 0.0,
            include_current_semester: false,
        }
    }
}

impl GradingProfile {
    pub fn grade_options(&self) -> GradeOptions {
        GradeOptions {
            boundaries: self.boundaries.clone(),
            rounding_method: self.rounding_method,
            decimal_places: self.decimal_places,
        }
    }

    pub fn cgpa_options(&self) -> CgpaOptions {
        CgpaOptions {
            gpa_scale: self.gpa_scale,
            weights: None,
            retake_policy: self.retake_policy,
            include_current_semester: self.include_current_semester,
        }
    }

    pub fn validate(&self) -> Result<(), CalcError> {
        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(CalcError::invalid_argument(format!(
                "decimalPlaces must be at most {}",
                MAX_DECIMAL_PLACES
            )));
        }
        if !self.retake_penalty_percent.is_finite() || self.retake_penalty_percent < 0.0 {
            return Err(CalcError::invalid_argument(
                "retakePenaltyPercent must be a non-negative number",
            ));
        }
        validate_boundaries(&self.boundaries, self.decimal_places)
    }

    /// Applies the keys present in `patch` on top of this profile.
    pub fn merged(&self, patch: &serde_json::Value) -> Result<GradingProfile, CalcError> {
        let Some(patch_obj) = patch.as_object() else {
            return Err(CalcError::new("bad_params", "profile update must be an object"));
        };
        let mut base = serde_json::to_value(self)
            .map_err(|e| CalcError::new("internal", e.to_string()))?;
        if let Some(base_obj) = base.as_object_mut() {
            for (k, v) in patch_obj {
                base_obj.insert(k.clone(), v.clone());
            }
        }
        let next: GradingProfile = serde_json::from_value(base).map_err(|e| {
            CalcError::new("bad_params", format!("invalid profile: {}", e))
                .with_details(json!({ "keys": patch_obj.keys().collect::<Vec<_>>() }))
        })?;
        next.validate()?;
        Ok(next)
    }
}

/// Stored profile, or defaults when no workspace is open or nothing was saved.
pub fn load_profile(conn: Option<&Connection>) -> anyhow::Result<GradingProfile> {
    let Some(conn) = conn else {
        return Ok(GradingProfile::default());
    };
    match db::settings_get_json(conn, PROFILE_KEY)? {
        Some(v) => Ok(serde_json::from_value(v)?),
        None => Ok(GradingProfile::default()),
    }
}

pub fn save_profile(conn: &Connection, profile: &GradingProfile) -> anyhow::Result<()> {
    db::settings_set_json(conn, PROFILE_KEY, &serde_json::to_value(profile)?)
}
