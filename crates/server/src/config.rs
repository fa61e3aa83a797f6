use anyhow::Context;
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tally_ingest::{ChatCompletionConfig, DEFAULT_COMPLETION_MODEL, DEFAULT_COMPLETION_URL};

const DEFAULT_BIND: &str = "0.0.0.0:5000";
const DEFAULT_DB_PATH: &str = "tally.db";
const DEFAULT_DEDUP_THRESHOLD: f32 = 0.7;
const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    /// Bunyan-style JSON lines.
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub completion: ChatCompletionConfig,
    /// TOML file overriding the built-in keyword rules.
    pub category_rules: Option<PathBuf>,
    pub dedup_threshold: f32,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind = var("TALLY_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse()
            .context("TALLY_BIND must be a socket address like 0.0.0.0:5000")?;

        let timeout_secs = match var("TALLY_COMPLETION_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .context("TALLY_COMPLETION_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_COMPLETION_TIMEOUT_SECS,
        };

        let dedup_threshold = match var("TALLY_DEDUP_THRESHOLD") {
            Some(raw) => raw
                .parse::<f32>()
                .context("TALLY_DEDUP_THRESHOLD must be a number")?,
            None => DEFAULT_DEDUP_THRESHOLD,
        };
        if !(0.0..=1.0).contains(&dedup_threshold) {
            anyhow::bail!("TALLY_DEDUP_THRESHOLD must be between 0 and 1, got {dedup_threshold}");
        }

        let log_format = match var("TALLY_LOG_FORMAT").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") | Some("bunyan") => LogFormat::Json,
            Some(other) => anyhow::bail!("Unknown TALLY_LOG_FORMAT '{other}'"),
        };

        Ok(Config {
            bind,
            db_path: PathBuf::from(var("TALLY_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string())),
            completion: ChatCompletionConfig {
                base_url: var("TALLY_COMPLETION_URL").unwrap_or_else(|| DEFAULT_COMPLETION_URL.to_string()),
                api_key: var("OPENAI_API_KEY"),
                model: var("TALLY_COMPLETION_MODEL").unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
            category_rules: var("TALLY_CATEGORY_RULES").map(PathBuf::from),
            dedup_threshold,
            log_format,
        })
    }
}
