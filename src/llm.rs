// src/llm.rs
//
// Language-model collaborators. `QuestionSource` feeds the quiz engine,
// `TutorAssistant` covers doubt chat and code review. `OpenRouterClient`
// implements both against an OpenAI-compatible chat completions endpoint.
// Logs carry model names, latencies and sizes, never contents or the key.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{error, info, instrument};

use crate::{
    config::{LlmConfig, QUIZ_QUESTION_COUNT},
    error::QuizError,
    models::{
        question::QuestionDraft,
        tutor::{CodeReview, DoubtAnswer},
    },
};

/// Produces (question, answer) pairs for a topic. May return an empty list.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn generate(&self, topic: &str) -> Result<Vec<QuestionDraft>, QuizError>;
}

#[async_trait]
pub trait TutorAssistant: Send + Sync {
    async fn answer_doubt(&self, question: &str) -> Result<DoubtAnswer, QuizError>;

    async fn evaluate_code(
        &self,
        topic: &str,
        language: &str,
        code: &str,
    ) -> Result<CodeReview, QuizError>;
}

#[derive(Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct QuizPayload {
    #[serde(default)]
    questions: Vec<QuestionDraft>,
}

impl OpenRouterClient {
    pub fn new(config: LlmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// JSON-object chat completion, deserialized into `T`.
    #[instrument(level = "info", skip(self, prompt), fields(model = %self.config.model, prompt_len = prompt.len()))]
    async fn chat_json<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, QuizError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| QuizError::SourceUnavailable("API key not configured".to_string()))?;

        let url = self
            .config
            .base_url
            .join("chat/completions")
            .map_err(|e| QuizError::SourceUnavailable(e.to_string()))?;

        let req = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            response_format: ResponseFormat {
                r#type: "json_object",
            },
        };

        let start = Instant::now();
        let res = self
            .client
            .post(url)
            .header(USER_AGENT, "tutor-backend/0.1")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                error!(elapsed = ?start.elapsed(), error = %e, "Model request failed");
                QuizError::SourceUnavailable(e.to_string())
            })?;

        let status = res.status();
        if !status.is_success() {
            error!(elapsed = ?start.elapsed(), %status, "Model returned an error status");
            return Err(QuizError::SourceUnavailable(format!(
                "API call failed with status {}",
                status
            )));
        }

        let body: ChatCompletionResponse = res
            .json()
            .await
            .map_err(|e| QuizError::SourceUnavailable(e.to_string()))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        info!(elapsed = ?start.elapsed(), response_len = text.len(), "Model response received");

        parse_model_json(&text)
    }
}

/// Parses the model's text as JSON. Malformed output is a source failure.
fn parse_model_json<T: DeserializeOwned>(text: &str) -> Result<T, QuizError> {
    serde_json::from_str(text.trim())
        .map_err(|e| QuizError::SourceUnavailable(format!("Invalid JSON from model: {}", e)))
}

fn quiz_prompt(topic: &str) -> String {
    format!(
        r#"You are a DSA TutorBot generating quizzes.
Topic: {topic}

Generate exactly {count} multiple-choice questions about the topic "{topic}".
Each question must have 4 options (A, B, C, D) and one correct answer.
Respond ONLY with valid JSON using this structure:
{{"topic": "{topic}", "questions": [{{"question": "string", "options": ["A", "B", "C", "D"], "answer": "A"}}]}}"#,
        topic = topic,
        count = QUIZ_QUESTION_COUNT,
    )
}

fn doubt_prompt(question: &str) -> String {
    format!(
        r#"You are a knowledgeable and friendly DSA TutorBot.
User Question: {question}

Respond only in strict JSON:
{{"detected_topic": "...", "response": "...", "complexity": "..."}}"#
    )
}

fn code_eval_prompt(topic: &str, language: &str, code: &str) -> String {
    format!(
        r#"You are a DSA TutorBot analyzing code.
Topic: {topic}
Language: {language}
Code:
{code}

Respond only in strict JSON:
{{"syntax_errors": "...", "logic_feedback": "...", "time_complexity": "...", "space_complexity": "...", "suggestion": "..."}}"#
    )
}

#[async_trait]
impl QuestionSource for OpenRouterClient {
    #[instrument(level = "info", skip(self))]
    async fn generate(&self, topic: &str) -> Result<Vec<QuestionDraft>, QuizError> {
        let payload: QuizPayload = self.chat_json(&quiz_prompt(topic)).await?;
        info!(count = payload.questions.len(), "Quiz questions generated");
        Ok(payload.questions)
    }
}

#[async_trait]
impl TutorAssistant for OpenRouterClient {
    async fn answer_doubt(&self, question: &str) -> Result<DoubtAnswer, QuizError> {
        self.chat_json(&doubt_prompt(question)).await
    }

    #[instrument(level = "info", skip(self, code), fields(code_len = code.len()))]
    async fn evaluate_code(
        &self,
        topic: &str,
        language: &str,
        code: &str,
    ) -> Result<CodeReview, QuizError> {
        self.chat_json(&code_eval_prompt(topic, language, code)).await
    }
}
