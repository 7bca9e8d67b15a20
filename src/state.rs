use std::sync::Arc;

use crate::config::Config;
use crate::engine::QuizEngine;
use crate::llm::{QuestionSource, TutorAssistant};
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub engine: QuizEngine,
    pub source: Arc<dyn QuestionSource>,
    pub assistant: Arc<dyn TutorAssistant>,
    pub config: Config,
}

impl FromRef<AppState> for QuizEngine {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<dyn QuestionSource> {
    fn from_ref(state: &AppState) -> Self {
        state.source.clone()
    }
}

impl FromRef<AppState> for Arc<dyn TutorAssistant> {
    fn from_ref(state: &AppState) -> Self {
        state.assistant.clone()
    }
}
