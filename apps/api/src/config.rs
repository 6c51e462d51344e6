use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::interview::orchestrator::{InterviewConfig, TierLimits};
use crate::llm_client::RetryPolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    /// Redis backend for the session snapshot and archive, when set.
    pub redis_url: Option<String>,
    /// File backend directory, used when Redis is not configured.
    pub data_dir: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
    pub tier_limits: TierLimits,
    /// Attempts per model call before giving up on transient failures.
    pub llm_max_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = TierLimits::default();
        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            redis_url: optional_env("REDIS_URL"),
            data_dir: optional_env("DATA_DIR").map(PathBuf::from),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            tier_limits: TierLimits {
                easy: seconds_env("EASY_TIMER_SECS", defaults.easy)?,
                medium: seconds_env("MEDIUM_TIMER_SECS", defaults.medium)?,
                hard: seconds_env("HARD_TIMER_SECS", defaults.hard)?,
            },
            llm_max_attempts: attempts_env("LLM_MAX_ATTEMPTS", RetryPolicy::default().max_attempts)?,
        })
    }

    /// Reference 3/4/3 schedule with the configured tier limits.
    pub fn interview_config(&self) -> InterviewConfig {
        InterviewConfig {
            limits: self.tier_limits,
            ..InterviewConfig::default()
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn attempts_env(key: &str, default: u32) -> Result<u32> {
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => {
            let attempts = raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("{key} must be a whole number"))?;
            anyhow::ensure!(attempts > 0, "{key} must be at least 1");
            Ok(attempts)
        }
    }
}

fn seconds_env(key: &str, default: u32) -> Result<u32> {
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => {
            let secs = raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("{key} must be a whole number of seconds"))?;
            anyhow::ensure!(secs > 0, "{key} must be greater than zero");
            Ok(secs)
        }
    }
}
