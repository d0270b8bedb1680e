//! Per-source processing - core ingestion logic.
//!
//! For one configured source this module scans every feed variant,
//! filters and extracts image media, marks new identifiers as seen, and
//! hands up to `max_per_run` images to the dispatcher.

use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::dispatch::{BatchDispatcher, DeliveryReport};
use crate::feed::{fetch_variant, FeedFetcher};
use crate::filter::is_blocked;
use crate::media::pick_media;
use crate::source::{SourceConfig, TopWindow};
use crate::state::SeenState;

/// Failure that aborts one source but not the run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source entry is not a valid source object: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("webhook for {source_id} is not a valid http(s) url")]
    InvalidWebhook { source_id: String },
}

/// Knobs shared by every source in a run.
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub max_per_run: usize,
    pub reddit_base_url: String,
    pub top_window: TopWindow,
}

/// Why a source was not processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither `subreddit` nor `rss_url` set
    NoFeed,
    /// No `webhook` set
    NoWebhook,
}

/// Counters for one processed source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub source_id: String,
    /// Entries returned by all variants
    pub entries_scanned: usize,
    /// Entries skipped because their identifier was already seen
    pub entries_already_seen: usize,
    /// Entries rejected by the blocklist
    pub entries_blocked: usize,
    /// Entries with no extractable image
    pub entries_without_media: usize,
    /// New identifiers recorded in state this run
    pub new_media: usize,
    /// Images handed to the dispatcher (capped at `max_per_run`)
    pub dispatched: usize,
    pub delivery: DeliveryReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Skipped(SkipReason),
    Processed(SourceReport),
}

/// Drives one source from fetch to delivery.
pub struct SourceProcessor<'a> {
    fetcher: &'a dyn FeedFetcher,
    dispatcher: &'a BatchDispatcher,
    settings: &'a ProcessorSettings,
}

impl<'a> SourceProcessor<'a> {
    pub fn new(
        fetcher: &'a dyn FeedFetcher,
        dispatcher: &'a BatchDispatcher,
        settings: &'a ProcessorSettings,
    ) -> Self {
        Self {
            fetcher,
            dispatcher,
            settings,
        }
    }

    /// Process a single source against the shared state.
    ///
    /// Identifiers are appended to the seen-list as soon as their image is
    /// extracted, before delivery is attempted, so delivery is at most
    /// once per identifier.
    pub async fn process(
        &self,
        config: &SourceConfig,
        state: &mut SeenState,
    ) -> Result<SourceOutcome, SourceError> {
        let kind = match config.kind() {
            Some(kind) => kind,
            None => {
                info!(reason = "no_feed", "source_skipped");
                return Ok(SourceOutcome::Skipped(SkipReason::NoFeed));
            }
        };
        let source_id = kind.source_id();

        let webhook = match config.webhook() {
            Some(webhook) => webhook,
            None => {
                info!(source_id = %source_id, reason = "no_webhook", "source_skipped");
                return Ok(SourceOutcome::Skipped(SkipReason::NoWebhook));
            }
        };

        if !is_http_url(webhook) {
            return Err(SourceError::InvalidWebhook { source_id });
        }

        info!(source_id = %source_id, source = %kind.label(), "source_processing_start");

        let history = state.source_mut(&source_id);
        let mut report = SourceReport {
            source_id: source_id.clone(),
            ..Default::default()
        };
        // insertion-ordered; identifiers are unique because each is
        // pushed to history on first sight
        let mut merged: Vec<(String, String)> = Vec::new();

        for feed in kind.feeds(&self.settings.reddit_base_url, self.settings.top_window) {
            let entries = fetch_variant(self.fetcher, &feed).await;
            let mut found = 0;

            for entry in &entries {
                report.entries_scanned += 1;
                let identifier = entry.identifier();

                if history.contains(&identifier) {
                    report.entries_already_seen += 1;
                    continue;
                }
                if is_blocked(entry) {
                    report.entries_blocked += 1;
                    continue;
                }

                match pick_media(entry) {
                    Some(media_url) => {
                        debug!(identifier = %identifier, media_url = %media_url, "media_found");
                        history.push(identifier.clone());
                        merged.push((identifier, media_url));
                        found += 1;
                    }
                    None => report.entries_without_media += 1,
                }
            }

            info!(
                source_id = %source_id,
                feed_url = %feed.url,
                entries = entries.len(),
                new_media = found,
                "feed_scanned"
            );
        }

        report.new_media = merged.len();

        let urls: Vec<String> = merged
            .into_iter()
            .take(self.settings.max_per_run)
            .map(|(_, url)| url)
            .collect();
        report.dispatched = urls.len();

        report.delivery = self.dispatcher.deliver(webhook, &urls).await;

        info!(
            source_id = %report.source_id,
            entries_scanned = report.entries_scanned,
            entries_already_seen = report.entries_already_seen,
            entries_blocked = report.entries_blocked,
            entries_without_media = report.entries_without_media,
            new_media = report.new_media,
            dispatched = report.dispatched,
            images_delivered = report.delivery.images_delivered,
            chunks_failed = report.delivery.chunks_failed,
            "source_processing_complete"
        );

        Ok(SourceOutcome::Processed(report))
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| (u.scheme() == "http" || u.scheme() == "https") && u.has_host())
        .unwrap_or(false)
}
