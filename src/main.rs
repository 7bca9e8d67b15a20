// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tutor_backend::{
    config::Config, curriculum::Curriculum, db, engine::QuizEngine, llm::OpenRouterClient,
    routes, state::AppState, store::QuizStore,
};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let curriculum = Curriculum::load(config.curriculum_path.as_deref())
        .expect("Failed to load curriculum");
    tracing::info!("Curriculum loaded with {} topics", curriculum.len());

    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    db::MIGRATOR
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    if config.llm.api_key.is_none() {
        tracing::warn!("OPENROUTER_KEY is not set; model-backed endpoints will fail");
    }
    let llm = Arc::new(
        OpenRouterClient::new(config.llm.clone()).expect("Failed to build HTTP client"),
    );

    // Create AppState
    let state = AppState {
        engine: QuizEngine::new(Arc::new(curriculum), QuizStore::new(pool)),
        source: llm.clone(),
        assistant: llm,
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}
