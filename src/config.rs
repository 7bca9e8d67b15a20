// src/config.rs

use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use url::Url;

/// Number of questions requested from the model per quiz.
pub const QUIZ_QUESTION_COUNT: usize = 5;

/// Difficulty hinted for a topic the user has never submitted.
pub const DEFAULT_DIFFICULTY: u8 = 3;

/// Fallback identity when a request does not name a user.
pub const DEFAULT_USER_ID: &str = "default_user";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub llm: LlmConfig,
    /// Optional TOML file overriding the built-in curriculum.
    pub curriculum_path: Option<String>,
}

/// Settings for the OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: Url,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: "mistralai/mistral-7b-instruct".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("https://openrouter.ai/api/v1/").expect("static url is valid")
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://progress.db?mode=rwc".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let defaults = LlmConfig::default();
        let base_url = match env::var("LLM_BASE_URL") {
            Ok(raw) => parse_base_url(&raw).unwrap_or_else(|| {
                tracing::warn!("LLM_BASE_URL '{}' is not a valid URL, using default", raw);
                defaults.base_url.clone()
            }),
            Err(_) => defaults.base_url.clone(),
        };

        let llm = LlmConfig {
            api_key: env::var("OPENROUTER_KEY").ok().filter(|k| !k.is_empty()),
            base_url,
            model: env::var("LLM_MODEL").unwrap_or(defaults.model),
            timeout: env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };

        let curriculum_path = env::var("CURRICULUM_PATH").ok().filter(|p| !p.is_empty());

        Self {
            database_url,
            rust_log,
            port,
            cors_origins,
            llm,
            curriculum_path,
        }
    }
}

/// Parses a base URL, forcing a trailing slash so `Url::join` keeps the path.
pub fn parse_base_url(raw: &str) -> Option<Url> {
    let mut raw = raw.trim().to_string();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    Url::parse(&raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_path_segment_on_join() {
        let url = parse_base_url("https://example.com/api/v1").unwrap();
        let endpoint = url.join("chat/completions").unwrap();
        assert_eq!(endpoint.as_str(), "https://example.com/api/v1/chat/completions");
    }

    #[test]
    fn base_url_rejects_garbage() {
        assert!(parse_base_url("not a url").is_none());
    }
}
