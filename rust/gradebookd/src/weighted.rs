use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    Midterm,
    Final,
    Quiz,
    Assignment,
    Practical,
    Project,
    #[serde(other)]
    Other,
}

/// Weight per known exam type. Missing entries and unknown types weigh 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExamTypeWeights {
    pub midterm: Option<f64>,
    #[serde(rename = "final")]
    pub final_exam: Option<f64>,
    pub quiz: Option<f64>,
    pub assignment: Option<f64>,
    pub practical: Option<f64>,
    pub project: Option<f64>,
}

impl ExamTypeWeights {
    pub fn weight_for(&self, exam_type: ExamType) -> f64 {
        let w = match exam_type {
            ExamType::Midterm => self.midterm,
            ExamType::Final => self.final_exam,
            ExamType::Quiz => self.quiz,
            ExamType::Assignment => self.assignment,
            ExamType::Practical => self.practical,
            ExamType::Project => self.project,
            ExamType::Other => None,
        };
        w.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExamScore {
    #[serde(rename = "type")]
    pub exam_type: ExamType,
    pub percentage: f64,
}

/// Weighted mean over the supplied scores only; weights of absent types do
/// not dilute the result. Returns 0 when nothing carries weight.
pub fn calculate_weighted_score(scores: &[ExamScore], weights: &ExamTypeWeights) -> f64 {
    let mut weighted_sum = 0.0_f64;
    let mut weight_total = 0.0_f64;
    for s in scores {
        let w = weights.weight_for(s.exam_type);
        weighted_sum += s.percentage * w;
        weight_total += w;
    }
    if weight_total == 0.0 {
        0.0
    } else {
        weighted_sum / weight_total
    }
}
