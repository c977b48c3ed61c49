use std::time::Duration;

use anyhow::{Context, Result};
use tracing::Level;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    /// Tender API root, without trailing slash.
    pub api_base_url: String,
    pub http_timeout: Duration,
    pub log_level: Level,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            log_level: Level::INFO,
        }
    }
}

impl WorkspaceConfig {
    pub fn from_env() -> Result<Self> {
        let api_base_url = dotenv::var("PINPOINT_API_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let http_timeout = match dotenv::var("PINPOINT_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid PINPOINT_HTTP_TIMEOUT_SECS: {}", raw))?,
            Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
        };
        let log_level = match dotenv::var("PINPOINT_LOG_LEVEL") {
            Ok(raw) => parse_level(&raw)?,
            Err(_) => Level::INFO,
        };

        Ok(Self {
            api_base_url: api_base_url.trim().trim_end_matches('/').to_string(),
            http_timeout: Duration::from_secs(http_timeout),
            log_level,
        })
    }
}

fn parse_level(raw: &str) -> Result<Level> {
    raw.trim()
        .parse::<Level>()
        .map_err(|_| anyhow::anyhow!("Invalid PINPOINT_LOG_LEVEL: {}", raw))
}
