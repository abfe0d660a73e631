use std::path::PathBuf;

use anyhow::{bail, Context, Result};

const DEV_SECRET_KEY: &str = "writing_assistant_secret_key";

/// Deployment flavour, selected by `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub anthropic_api_key: String,
    pub anthropic_api_url: String,
    pub claude_model: String,
    pub max_tokens: u32,
    pub secret_key: String,
    pub upload_folder: PathBuf,
    pub max_content_length: usize,
    pub max_files_per_category: usize,
    pub file_retention_days: u32,
    pub sweep_interval_secs: u64,
    pub host: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let environment = Environment::parse(&optional_env("APP_ENV", "development"));

        // Production must never sign cookies with the well-known development key.
        let secret_key = match std::env::var("SECRET_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ if environment == Environment::Production => {
                bail!("Required environment variable 'SECRET_KEY' is not set (APP_ENV=production)")
            }
            _ => DEV_SECRET_KEY.to_string(),
        };

        let upload_folder = match environment {
            Environment::Testing => optional_env("UPLOAD_FOLDER", "test_uploads"),
            _ => optional_env("UPLOAD_FOLDER", "uploads"),
        };

        Ok(Config {
            environment,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_api_url: optional_env("ANTHROPIC_API_URL", "https://api.anthropic.com"),
            claude_model: optional_env("CLAUDE_MODEL", crate::llm_client::DEFAULT_MODEL),
            max_tokens: parse_env("MAX_TOKENS", 4000)?,
            secret_key,
            upload_folder: PathBuf::from(upload_folder),
            max_content_length: parse_env("MAX_CONTENT_LENGTH", 10 * 1024 * 1024)?,
            max_files_per_category: parse_env("MAX_FILES_PER_CATEGORY", 3)?,
            file_retention_days: parse_env("FILE_RETENTION_DAYS", 7)?,
            sweep_interval_secs: parse_env("SWEEP_INTERVAL_SECS", 24 * 60 * 60)?,
            host: optional_env("HOST", "127.0.0.1"),
            port: parse_env("PORT", 5001)?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }

    /// Retention window as a chrono duration.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.file_retention_days))
    }
}

#[cfg(test)]
impl Config {
    /// Configuration for handler tests: scratch upload root, small limits.
    pub fn for_tests(upload_folder: PathBuf) -> Self {
        Config {
            environment: Environment::Testing,
            anthropic_api_key: "test-key".to_string(),
            anthropic_api_url: "http://127.0.0.1:9".to_string(),
            claude_model: crate::llm_client::DEFAULT_MODEL.to_string(),
            max_tokens: 1000,
            secret_key: "test-secret".to_string(),
            upload_folder,
            max_content_length: 64 * 1024,
            max_files_per_category: 3,
            file_retention_days: 7,
            sweep_interval_secs: 3600,
            host: "127.0.0.1".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
