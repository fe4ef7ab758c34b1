use crate::calc::CalcError;
use crate::grades::GradeSystem;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One attempt at one course in one semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseGrade {
    pub course_id: String,
    pub course_name: String,
    pub credit_hours: f64,
    pub percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade_point: Option<f64>,
    #[serde(default)]
    pub is_retake: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_number: Option<u32>,
}

impl CourseGrade {
    pub fn attempt(&self) -> u32 {
        self.attempt_number.unwrap_or(1)
    }

    pub fn validate(&self) -> Result<(), CalcError> {
        if !self.credit_hours.is_finite() || self.credit_hours <= 0.0 {
            return Err(CalcError::invalid_argument(format!(
                "course {}: creditHours must be positive",
                self.course_id
            )));
        }
        if !self.percentage.is_finite() {
            return Err(CalcError::invalid_argument(format!(
                "course {}: percentage must be finite",
                self.course_id
            )));
        }
        if self.grade_point.map(|g| !g.is_finite()).unwrap_or(false) {
            return Err(CalcError::invalid_argument(format!(
                "course {}: gradePoint must be finite",
                self.course_id
            )));
        }
        if self.attempt_number == Some(0) {
            return Err(CalcError::invalid_argument(format!(
                "course {}: attemptNumber starts at 1",
                self.course_id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetakePolicy {
    #[default]
    Best,
    Latest,
    Average,
}

/// Deducts `penalty_percent` for every attempt after the first, never below 0.
pub fn apply_retake_penalty(percentage: f64, attempt_number: u32, penalty_percent: f64) -> f64 {
    if attempt_number <= 1 {
        return percentage;
    }
    let deduction = (attempt_number - 1) as f64 * penalty_percent;
    (percentage - deduction).max(0.0)
}

/// Collapses attempts sharing a `course_id` into one effective record.
/// Groups come back in order of first appearance.
pub fn resolve_retakes(courses: &[CourseGrade], policy: RetakePolicy) -> Vec<CourseGrade> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&CourseGrade>> = HashMap::new();
    for c in courses {
        let key = c.course_id.as_str();
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(c);
    }

    let mut resolved = Vec::with_capacity(order.len());
    for key in order {
        let Some(mut attempts) = groups.remove(key) else {
            continue;
        };
        if attempts.len() == 1 {
            resolved.push(attempts[0].clone());
            continue;
        }
        // Stable: equal attempt numbers keep input order.
        attempts.sort_by_key(|c| c.attempt());
        resolved.push(resolve_group(&attempts, policy));
    }
    resolved
}

fn resolve_group(sorted: &[&CourseGrade], policy: RetakePolicy) -> CourseGrade {
    match policy {
        RetakePolicy::Best => {
            let mut best = sorted[0];
            for c in &sorted[1..] {
                if c.percentage > best.percentage {
                    best = c;
                }
            }
            best.clone()
        }
        RetakePolicy::Latest => sorted[sorted.len() - 1].clone(),
        RetakePolicy::Average => {
            let sum: f64 = sorted.iter().map(|c| c.percentage).sum();
            let mut avg = sorted[0].clone();
            avg.percentage = sum / sorted.len() as f64;
            avg.grade_point = None;
            avg
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttempt {
    pub id: String,
    #[serde(default)]
    pub attempt_number: Option<u32>,
    pub date: NaiveDate,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Pending,
    Passed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamAttempt {
    pub id: String,
    pub attempt_number: u32,
    pub date: NaiveDate,
    pub raw_score: Option<f64>,
    pub adjusted_score: Option<f64>,
    pub penalty: f64,
    pub status: AttemptStatus,
}

pub fn derive_attempts(raw: &[RawAttempt], penalty_percent: f64) -> Vec<ExamAttempt> {
    let pass_mark = GradeSystem::Percentage.default_pass_threshold();
    let mut out: Vec<ExamAttempt> = raw
        .iter()
        .map(|r| {
            let attempt_number = r.attempt_number.unwrap_or(1);
            let adjusted = r
                .score
                .map(|s| apply_retake_penalty(s, attempt_number, penalty_percent));
            let status = match adjusted {
                None => AttemptStatus::Pending,
                Some(s) if s >= pass_mark => AttemptStatus::Passed,
                Some(_) => AttemptStatus::Failed,
            };
            ExamAttempt {
                id: r.id.clone(),
                attempt_number,
                date: r.date,
                raw_score: r.score,
                adjusted_score: adjusted,
                penalty: match (r.score, adjusted) {
                    (Some(s), Some(a)) => s - a,
                    _ => 0.0,
                },
                status,
            }
        })
        .collect();
    out.sort_by(|a, b| {
        a.attempt_number
            .cmp(&b.attempt_number)
            .then(a.date.cmp(&b.date))
    });
    out
}

/// Policy applied to the adjusted scores of the scored attempts. `attempts`
/// must already be in attempt order, as `derive_attempts` returns them.
pub fn effective_attempt_score(attempts: &[ExamAttempt], policy: RetakePolicy) -> Option<f64> {
    let scored: Vec<f64> = attempts.iter().filter_map(|a| a.adjusted_score).collect();
    if scored.is_empty() {
        return None;
    }
    match policy {
        RetakePolicy::Best => scored.iter().copied().reduce(f64::max),
        RetakePolicy::Latest => scored.last().copied(),
        RetakePolicy::Average => Some(scored.iter().sum::<f64>() / scored.len() as f64),
    }
}
