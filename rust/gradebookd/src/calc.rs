use serde::{Deserialize, Serialize};

/// Half-up rounding used for every reported figure:
/// `floor(x * 10^places + 0.5) / 10^places`
pub fn round_half_up(x: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    ((x * factor) + 0.5).floor() / factor
}

/// Two-decimal rounding applied to GPA, credit and point totals.
pub fn round_2(x: f64) -> f64 {
    round_half_up(x, 2)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingMethod {
    #[default]
    Round,
    Floor,
    Ceil,
}

impl RoundingMethod {
    pub fn apply(self, x: f64, places: u32) -> f64 {
        let factor = 10_f64.powi(places as i32);
        match self {
            RoundingMethod::Round => round_half_up(x, places),
            RoundingMethod::Floor => (x * factor).floor() / factor,
            RoundingMethod::Ceil => (x * factor).ceil() / factor,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CalcError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CalcError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("invalid_argument", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for CalcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for CalcError {}
