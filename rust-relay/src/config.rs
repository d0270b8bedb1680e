//! Configuration module for environment variable parsing.
//!
//! Everything except the source list is optional and falls back to a
//! default. The source list is parsed separately by [`parse_sources`]
//! because a malformed list is the one fatal configuration error.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::source::TopWindow;

/// Default identifying client header sent with every feed request.
pub const DEFAULT_USER_AGENT: &str = "github-actions-universal-bot/1.0";

/// Errors raised while reading the top-level source list.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BOT_CONFIG is not a JSON array of source objects: {0}")]
    MalformedSources(#[from] serde_json::Error),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Raw JSON source list (`BOT_CONFIG`)
    pub bot_config: String,

    /// Time window for the reddit `top` listing
    pub top_window: TopWindow,

    /// Maximum images dispatched per source per run
    pub max_per_run: usize,

    /// Path of the persisted dedup state
    pub state_file: PathBuf,

    /// User agent for feed requests
    pub user_agent: String,

    /// Webhook request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Feed request timeout in milliseconds
    pub feed_timeout_ms: u64,

    /// Base URL for reddit listings (no trailing slash)
    pub reddit_base_url: String,

    /// Pause between sources in milliseconds
    pub source_delay_ms: u64,

    /// Pause between webhook chunks in milliseconds
    pub batch_delay_ms: u64,

    /// Upper bound for a single rate-limit sleep in milliseconds
    pub retry_after_ceiling_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot_config: "[]".to_string(),
            top_window: TopWindow::Day,
            max_per_run: 30,
            state_file: PathBuf::from("state.json"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_ms: 30_000,
            feed_timeout_ms: 30_000,
            reddit_base_url: "https://old.reddit.com".to_string(),
            source_delay_ms: 1_000,
            batch_delay_ms: 1_000,
            retry_after_ceiling_ms: 60_000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            bot_config: env::var("BOT_CONFIG")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.bot_config),

            top_window: parse_top_window("TOP_TIME", defaults.top_window),

            max_per_run: parse_number("MAX_PER_RUN", defaults.max_per_run),

            state_file: env::var("STATE_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.state_file),

            user_agent: env::var("USER_AGENT")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.user_agent),

            request_timeout_ms: parse_number("REQUEST_TIMEOUT_MS", defaults.request_timeout_ms),

            feed_timeout_ms: parse_number("FEED_TIMEOUT_MS", defaults.feed_timeout_ms),

            reddit_base_url: env::var("REDDIT_BASE_URL")
                .ok()
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.reddit_base_url),

            source_delay_ms: parse_number("SOURCE_DELAY_MS", defaults.source_delay_ms),

            batch_delay_ms: parse_number("BATCH_DELAY_MS", defaults.batch_delay_ms),

            retry_after_ceiling_ms: parse_number(
                "RETRY_AFTER_CEILING_MS",
                defaults.retry_after_ceiling_ms,
            ),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_millis(self.feed_timeout_ms)
    }

    pub fn source_delay(&self) -> Duration {
        Duration::from_millis(self.source_delay_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn retry_after_ceiling(&self) -> Duration {
        Duration::from_millis(self.retry_after_ceiling_ms)
    }
}

/// Parse the `BOT_CONFIG` JSON array into raw source entries.
///
/// Only the top-level shape is validated here. Each element is decoded
/// into a [`SourceConfig`](crate::source::SourceConfig) later, inside the
/// per-source failure boundary, so one mistyped entry fails alone.
pub fn parse_sources(raw: &str) -> Result<Vec<serde_json::Value>, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

/// Parse a numeric variable, warning and falling back on garbage.
fn parse_number<T: std::str::FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}

fn parse_top_window(name: &str, default: TopWindow) -> TopWindow {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match TopWindow::parse(&raw) {
        Some(window) => window,
        None => {
            warn!(env_var = name, value = %raw, "Unknown top window, using default");
            default
        }
    }
}
