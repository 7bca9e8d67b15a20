// src/models/question.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

use crate::config::DEFAULT_USER_ID;

/// Represents the 'generated_questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub id: i64,
    pub batch_id: i64,
    pub user_id: String,
    pub topic: String,

    /// Position within its generation batch, starting at 0.
    pub ordinal: i64,

    pub question: String,

    /// Multiple-choice options as produced by the model.
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// The expected answer.
    pub answer: String,

    pub user_answer: Option<String>,
    pub is_correct: Option<bool>,
}

/// One (question, answer) pair produced by the question source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub answer: String,
}

impl QuestionDraft {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            options: Vec::new(),
            answer: answer.into(),
        }
    }
}

/// A single answered question joined for the history view.
#[derive(Debug, Serialize, FromRow)]
pub struct AttemptEntry {
    pub topic: String,
    pub question: String,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: Option<bool>,
    pub answered_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for requesting a quiz on one curriculum topic.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[serde(default = "default_user")]
    #[validate(length(min = 1, max = 100))]
    pub user_id: String,
    #[validate(length(min = 1, max = 500))]
    pub topic: String,
}

/// DTO returned by quiz generation.
#[derive(Debug, Serialize)]
pub struct GeneratedQuiz {
    pub topic: String,
    pub questions: Vec<QuestionDraft>,
    pub difficulty: super::progress::Difficulty,
}

/// DTO for submitting answers to the latest batch.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitQuizRequest {
    #[serde(default = "default_user")]
    #[validate(length(min = 1, max = 100))]
    pub user_id: String,
    #[validate(length(min = 1, max = 500))]
    pub topic: String,

    /// User's answers map.
    /// Key: ordinal position within the batch
    /// Value: submitted answer
    pub answers: BTreeMap<usize, String>,
}

/// Query string carrying the user identity.
#[derive(Debug, Deserialize)]
pub struct UserQuery {
    #[serde(default = "default_user")]
    pub user_id: String,
}

pub(crate) fn default_user() -> String {
    DEFAULT_USER_ID.to_string()
}
