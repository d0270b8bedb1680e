//! FeedRelay - single batch pass over all configured feeds.
//!
//! Polls every source in `BOT_CONFIG`, relays newly discovered images to
//! each source's webhook, persists dedup state and exits.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use feedrelay::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    tracing::info!("relay_starting");

    // Load configuration from environment
    let config = Config::from_env();
    tracing::info!(
        top_window = config.top_window.as_str(),
        max_per_run = config.max_per_run,
        state_file = %config.state_file.display(),
        reddit_base_url = %config.reddit_base_url,
        "config_loaded"
    );

    if let Err(e) = feedrelay::run(&config).await {
        tracing::error!(error = %format!("{:#}", e), "run_aborted");
        return Err(e);
    }

    Ok(())
}
