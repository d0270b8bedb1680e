//! Run orchestration.
//!
//! A run:
//! 1. Parses the source list (the only fatal failure)
//! 2. Loads dedup state once
//! 3. Decodes and processes sources in list order, isolating each one's failures
//! 4. Saves state once, whatever happened in between

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::FutureExt;
use serde_json::Value;
use tracing::{error, info};

use crate::config::{parse_sources, Config};
use crate::dispatch::{BatchDispatcher, DispatchSettings, ReqwestTransport, WebhookTransport};
use crate::feed::{FeedFetcher, HttpFeedFetcher};
use crate::processor::{ProcessorSettings, SourceError, SourceOutcome, SourceProcessor};
use crate::source::SourceConfig;
use crate::state::{SeenState, StateStore};
use crate::util::{Pacer, TokioPacer};

/// Totals for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sources_total: usize,
    pub sources_processed: usize,
    pub sources_skipped: usize,
    pub sources_failed: usize,
    pub images_delivered: usize,
    pub chunks_failed: usize,
    pub state_saved: bool,
}

/// Wiring of fetcher, dispatcher and pacing for one run.
pub struct Relay {
    fetcher: Arc<dyn FeedFetcher>,
    dispatcher: BatchDispatcher,
    pacer: Arc<dyn Pacer>,
    settings: ProcessorSettings,
    source_delay: Duration,
}

impl Relay {
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        transport: Arc<dyn WebhookTransport>,
        pacer: Arc<dyn Pacer>,
        config: &Config,
    ) -> Self {
        let dispatcher = BatchDispatcher::new(
            transport,
            pacer.clone(),
            DispatchSettings {
                batch_delay: config.batch_delay(),
                retry_after_ceiling: config.retry_after_ceiling(),
            },
        );

        Self {
            fetcher,
            dispatcher,
            pacer,
            settings: ProcessorSettings {
                max_per_run: config.max_per_run,
                reddit_base_url: config.reddit_base_url.clone(),
                top_window: config.top_window,
            },
            source_delay: config.source_delay(),
        }
    }

    /// Build the HTTP-backed relay.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFeedFetcher::new(&config.user_agent, config.feed_timeout())
            .context("Failed to create feed HTTP client")?;
        let transport = ReqwestTransport::new(config.request_timeout())
            .context("Failed to create webhook HTTP client")?;

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(transport),
            Arc::new(TokioPacer),
            config,
        ))
    }

    /// Load state, process every source, save state.
    pub async fn run_with_store(&self, sources: &[Value], store: &StateStore) -> RunSummary {
        let mut state = store.load();

        let mut summary = self.run_sources(sources, &mut state).await;

        match store.save(&mut state) {
            Ok(()) => summary.state_saved = true,
            Err(e) => {
                error!(path = %store.path().display(), error = %e, "state_save_failed");
            }
        }

        summary
    }

    /// Process sources in order. A malformed, failing or panicking source
    /// is logged and the loop moves on.
    pub async fn run_sources(&self, sources: &[Value], state: &mut SeenState) -> RunSummary {
        let mut summary = RunSummary {
            sources_total: sources.len(),
            ..Default::default()
        };
        let processor = SourceProcessor::new(self.fetcher.as_ref(), &self.dispatcher, &self.settings);

        for (index, source) in sources.iter().enumerate() {
            if index > 0 {
                self.pacer.pause(self.source_delay).await;
            }

            let result = AssertUnwindSafe(process_entry(&processor, source, state))
                .catch_unwind()
                .await;

            match result {
                Ok(Ok(SourceOutcome::Processed(report))) => {
                    summary.sources_processed += 1;
                    summary.images_delivered += report.delivery.images_delivered;
                    summary.chunks_failed += report.delivery.chunks_failed;
                }
                Ok(Ok(SourceOutcome::Skipped(_))) => {
                    summary.sources_skipped += 1;
                }
                Ok(Err(e)) => {
                    summary.sources_failed += 1;
                    error!(source_index = index, error = %e, "source_failed");
                }
                Err(panic) => {
                    summary.sources_failed += 1;
                    error!(
                        source_index = index,
                        panic = %panic_message(panic.as_ref()),
                        "source_panicked"
                    );
                }
            }
        }

        summary
    }
}

async fn process_entry(
    processor: &SourceProcessor<'_>,
    raw: &Value,
    state: &mut SeenState,
) -> Result<SourceOutcome, SourceError> {
    let config = SourceConfig::from_value(raw)?;
    processor.process(&config, state).await
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Execute one complete pass over the configured sources.
///
/// Fails only when `BOT_CONFIG` is malformed or the HTTP clients cannot
/// be built; in both cases nothing is fetched and state is untouched.
pub async fn run(config: &Config) -> Result<RunSummary> {
    let sources = parse_sources(&config.bot_config).context("Failed to read BOT_CONFIG")?;
    info!(sources = sources.len(), "sources_loaded");

    let relay = Relay::from_config(config)?;
    let store = StateStore::new(&config.state_file);

    let summary = relay.run_with_store(&sources, &store).await;

    info!(
        sources_total = summary.sources_total,
        sources_processed = summary.sources_processed,
        sources_skipped = summary.sources_skipped,
        sources_failed = summary.sources_failed,
        images_delivered = summary.images_delivered,
        chunks_failed = summary.chunks_failed,
        state_saved = summary.state_saved,
        "run_complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedEntry;
    use crate::test_support::{image_entry, RecordingPacer, ScriptedTransport, StaticFeeds};
    use async_trait::async_trait;

    const HOOK: &str = "https://discord.example/api/webhooks/1/token";

    fn entries(sources: Vec<SourceConfig>) -> Vec<Value> {
        sources
            .into_iter()
            .map(|s| serde_json::to_value(s).unwrap())
            .collect()
    }

    fn test_config() -> Config {
        Config {
            reddit_base_url: "https://reddit.test".to_string(),
            ..Config::default()
        }
    }

    struct Fixture {
        feeds: Arc<StaticFeeds>,
        transport: Arc<ScriptedTransport>,
        pacer: Arc<RecordingPacer>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                feeds: Arc::new(StaticFeeds::default()),
                transport: Arc::new(ScriptedTransport::default()),
                pacer: Arc::new(RecordingPacer::default()),
            }
        }

        fn relay(&self) -> Relay {
            Relay::new(
                self.feeds.clone(),
                self.transport.clone(),
                self.pacer.clone(),
                &test_config(),
            )
        }
    }

    struct PanickingFetcher;

    #[async_trait]
    impl FeedFetcher for PanickingFetcher {
        async fn fetch(&self, url: &str) -> Vec<FeedEntry> {
            if url.contains("/r/broken/") {
                panic!("feed exploded");
            }
            vec![image_entry("t3_ok", "Lake", "https://i.redd.it/lake.jpg")]
        }
    }

    #[tokio::test]
    async fn test_sources_paced_and_counted() {
        let fixture = Fixture::new();
        fixture.feeds.set(
            "https://reddit.test/r/pics/new/.rss",
            vec![image_entry("t3_a", "Lake", "https://i.redd.it/a.jpg")],
        );
        let sources = entries(vec![
            SourceConfig::subreddit("pics", HOOK),
            SourceConfig {
                subreddit: Some("nowebhook".to_string()),
                ..Default::default()
            },
            SourceConfig::subreddit("pics", "not a url"),
        ]);
        let mut state = SeenState::default();

        let summary = fixture.relay().run_sources(&sources, &mut state).await;

        assert_eq!(
            summary,
            RunSummary {
                sources_total: 3,
                sources_processed: 1,
                sources_skipped: 1,
                sources_failed: 1,
                images_delivered: 1,
                chunks_failed: 0,
                state_saved: false,
            }
        );
        // one pause between each pair of sources
        assert_eq!(fixture.pacer.pauses(), vec![Duration::from_secs(1); 2]);
    }

    #[tokio::test]
    async fn test_panicking_source_does_not_stop_run() {
        let fixture = Fixture::new();
        let relay = Relay::new(
            Arc::new(PanickingFetcher),
            fixture.transport.clone(),
            fixture.pacer.clone(),
            &test_config(),
        );
        let sources = entries(vec![
            SourceConfig::subreddit("broken", HOOK),
            SourceConfig::subreddit("fine", HOOK),
        ]);
        let mut state = SeenState::default();

        let summary = relay.run_sources(&sources, &mut state).await;

        assert_eq!(summary.sources_failed, 1);
        assert_eq!(summary.sources_processed, 1);
        assert_eq!(fixture.transport.image_urls(), vec!["https://i.redd.it/lake.jpg".to_string()]);
        assert!(state.source("reddit_fine").unwrap().contains("t3_ok"));
    }

    #[tokio::test]
    async fn test_mistyped_source_fails_alone() {
        let fixture = Fixture::new();
        fixture.feeds.set(
            "https://reddit.test/r/pics/new/.rss",
            vec![image_entry("t3_a", "Lake", "https://i.redd.it/a.jpg")],
        );
        let sources = vec![
            serde_json::json!({"subreddit": 42, "webhook": HOOK}),
            serde_json::json!("oops"),
            serde_json::json!({"subreddit": "pics", "webhook": HOOK}),
        ];
        let mut state = SeenState::default();

        let summary = fixture.relay().run_sources(&sources, &mut state).await;

        assert_eq!(summary.sources_failed, 2);
        assert_eq!(summary.sources_processed, 1);
        assert_eq!(fixture.transport.image_urls(), vec!["https://i.redd.it/a.jpg".to_string()]);
        assert_eq!(state.len(), 1);
    }

    #[tokio::test]
    async fn test_run_with_store_persists_progress() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        let fixture = Fixture::new();
        fixture.feeds.set(
            "https://reddit.test/r/pics/hot/.rss",
            vec![image_entry("t3_a", "Lake", "https://i.redd.it/a.jpg")],
        );
        let sources = entries(vec![SourceConfig::subreddit("pics", HOOK)]);

        let summary = fixture.relay().run_with_store(&sources, &store).await;
        assert!(summary.state_saved);
        assert!(store.load().source("reddit_pics").unwrap().contains("t3_a"));

        // same upstream content, nothing new to send
        let summary = fixture.relay().run_with_store(&sources, &store).await;
        assert_eq!(summary.images_delivered, 0);
        assert_eq!(fixture.transport.post_sizes(), vec![1]);
    }

    #[tokio::test]
    async fn test_run_rejects_malformed_config() {
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("state.json");
        let config = Config {
            bot_config: "{\"subreddit\": ".to_string(),
            state_file: state_file.clone(),
            ..Config::default()
        };

        assert!(run(&config).await.is_err());
        assert!(!state_file.exists());
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static message");
        assert_eq!(panic_message(boxed.as_ref()), "static message");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned message"));
        assert_eq!(panic_message(boxed.as_ref()), "owned message");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(42);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
