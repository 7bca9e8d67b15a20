// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{quiz, tutor},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges the quiz and tutor sub-routers.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (engine, model clients, config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.config.cors_origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/generate", post(quiz::generate_quiz))
        .route("/submit", post(quiz::submit_quiz))
        .route("/topics", get(quiz::list_topics))
        .route("/history", get(quiz::get_history));

    let tutor_routes = Router::new()
        .route("/chat", post(tutor::ask_doubt))
        .route("/code-eval", post(tutor::evaluate_code));

    Router::new()
        .nest("/api/quiz", quiz_routes)
        .nest("/api/tutor", tutor_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `*` allows any origin; otherwise each entry must be a valid header value.
fn allowed_origins(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|o| o == "*") {
        return AllowOrigin::from(Any);
    }

    let list: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    AllowOrigin::list(list)
}
