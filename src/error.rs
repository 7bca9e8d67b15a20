// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Failures of the quiz progression engine.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    #[error("quiz locked, complete previous quiz first")]
    Locked { next_allowed_topic: Option<String> },

    #[error("question source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("store failure: {0}")]
    Store(#[from] sqlx::Error),
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 403 Forbidden, topic requested out of sequence
    Locked {
        message: String,
        unlocked_topic: Option<String>,
    },

    // 502 Bad Gateway, the language model failed
    UpstreamError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Locked {
                message,
                unlocked_topic,
            } => (
                StatusCode::FORBIDDEN,
                json!({ "error": message, "unlocked_topic": unlocked_topic }),
            ),
            AppError::UpstreamError(msg) => {
                tracing::error!("Upstream model error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "Language model request failed" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        match err {
            QuizError::UnknownTopic(topic) => {
                AppError::BadRequest(format!("Invalid topic: {}", topic))
            }
            QuizError::Locked { next_allowed_topic } => AppError::Locked {
                message: "Quiz locked. Complete previous quiz first.".to_string(),
                unlocked_topic: next_allowed_topic,
            },
            QuizError::SourceUnavailable(reason) => AppError::UpstreamError(reason),
            QuizError::Store(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
