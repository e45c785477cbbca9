use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_PARSER_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_COMPANY_MODEL: &str = "compound-beta";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
    /// Settings for the job-description parsing calls.
    pub parser_llm: LlmConfig,
    /// Settings for the company profile / review aggregation calls.
    pub company_llm: LlmConfig,
}

/// Connection settings for one chat-completion consumer.
///
/// `api_key` is optional: without it every LLM-backed component degrades to
/// its deterministic fallback and never touches the network.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_key = optional_env("GROQ_API_KEY");
        let api_url =
            optional_env("GROQ_API_URL").unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string());

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            upload_dir: optional_env("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./uploads")),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            parser_llm: LlmConfig {
                api_key: api_key.clone(),
                api_url: api_url.clone(),
                model: optional_env("GROQ_MODEL")
                    .unwrap_or_else(|| DEFAULT_PARSER_MODEL.to_string()),
                timeout: Duration::from_secs(parse_secs("LLM_TIMEOUT_SECS", 30)?),
            },
            company_llm: LlmConfig {
                api_key,
                api_url,
                model: optional_env("GROQ_COMPANY_MODEL")
                    .unwrap_or_else(|| DEFAULT_COMPANY_MODEL.to_string()),
                timeout: Duration::from_secs(parse_secs("COMPANY_TIMEOUT_SECS", 60)?),
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Treats unset and blank values the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_secs(key: &str, default: u64) -> Result<u64> {
    match optional_env(key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds")),
        None => Ok(default),
    }
}
