// src/models/tutor.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::question::default_user;

/// DTO for asking the tutor a free-form question.
#[derive(Debug, Deserialize, Validate)]
pub struct DoubtRequest {
    #[serde(default = "default_user")]
    #[validate(length(min = 1, max = 100))]
    pub user_id: String,
    #[validate(length(min = 1, max = 4000))]
    pub question: String,
}

/// Structured answer returned by the assistant for a doubt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoubtAnswer {
    #[serde(default)]
    pub detected_topic: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub complexity: String,
}

/// DTO for submitting code for review.
#[derive(Debug, Deserialize, Validate)]
pub struct CodeEvalRequest {
    #[serde(default = "default_user")]
    #[validate(length(min = 1, max = 100))]
    pub user_id: String,
    #[validate(length(min = 1, max = 500))]
    pub topic: String,
    #[validate(length(min = 1, max = 30))]
    pub language: String,
    #[validate(length(min = 1, max = 20000))]
    pub code: String,
}

/// Structured review returned by the assistant for a code submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeReview {
    #[serde(default)]
    pub syntax_errors: String,
    #[serde(default)]
    pub logic_feedback: String,
    #[serde(default)]
    pub time_complexity: String,
    #[serde(default)]
    pub space_complexity: String,
    #[serde(default)]
    pub suggestion: String,
}
