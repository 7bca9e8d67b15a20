// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    engine::QuizEngine,
    error::AppError,
    llm::QuestionSource,
    models::question::{GenerateQuizRequest, SubmitQuizRequest, UserQuery},
};

/// Generates a quiz for the requested topic.
///
/// * Rejects topics outside the curriculum (400) or not yet unlocked (403).
/// * Asks the question source for a batch and stores it for later scoring.
/// * Returns the questions with a difficulty hint from the last attempt.
pub async fn generate_quiz(
    State(engine): State<QuizEngine>,
    State(source): State<Arc<dyn QuestionSource>>,
    Json(req): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let quiz = engine
        .generate_quiz(source.as_ref(), &req.user_id, &req.topic)
        .await
        .map_err(|e| {
            tracing::warn!("Quiz generation for '{}' failed: {}", req.topic, e);
            e
        })?;

    Ok(Json(quiz))
}

/// Scores the submitted answers against the latest generated batch.
///
/// Keys of `answers` are ordinal positions within that batch; positions the
/// batch does not have are ignored.
pub async fn submit_quiz(
    State(engine): State<QuizEngine>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let result = engine
        .score_submission(&req.user_id, &req.topic, &req.answers)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Quiz submitted successfully",
        "correct_answers": result.correct_count,
        "incorrect_answers": result.incorrect_count,
        "accuracy": result.accuracy,
        "difficulty": result.difficulty,
    })))
}

/// Lists every curriculum topic with its status for the user.
pub async fn list_topics(
    State(engine): State<QuizEngine>,
    Query(params): Query<UserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let topics = engine.topic_statuses(&params.user_id).await?;
    Ok(Json(topics))
}

/// Retrieves the user's answered questions, newest first.
pub async fn get_history(
    State(engine): State<QuizEngine>,
    Query(params): Query<UserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let history = engine.store().quiz_history(&params.user_id).await?;

    Ok(Json(serde_json::json!({ "history": history })))
}
