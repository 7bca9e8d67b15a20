// src/handlers/tutor.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    engine::QuizEngine,
    error::AppError,
    llm::TutorAssistant,
    models::tutor::{CodeEvalRequest, DoubtRequest},
};

/// Answers a free-form question and logs the exchange.
pub async fn ask_doubt(
    State(engine): State<QuizEngine>,
    State(assistant): State<Arc<dyn TutorAssistant>>,
    Json(req): Json<DoubtRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let answer = assistant.answer_doubt(&req.question).await?;

    engine
        .store()
        .insert_doubt(&req.user_id, &req.question, &answer)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store doubt: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(answer))
}

/// Reviews a code submission and logs the result.
pub async fn evaluate_code(
    State(engine): State<QuizEngine>,
    State(assistant): State<Arc<dyn TutorAssistant>>,
    Json(req): Json<CodeEvalRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let review = assistant
        .evaluate_code(&req.topic, &req.language, &req.code)
        .await?;

    engine
        .store()
        .insert_code_attempt(&req.user_id, &req.topic, &req.language, &req.code, &review)
        .await
        .map_err(|e| {
            tracing::error!("Failed to store code attempt: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(review))
}
