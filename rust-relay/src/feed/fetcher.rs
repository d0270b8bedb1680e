//! Feed fetching and normalisation into [`FeedEntry`] records.

use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::types::{FeedEntry, MediaContent};
use crate::source::FeedVariant;
use crate::util::user_agent::build_headers;

/// Source of feed entries.
///
/// Implementations never fail: transport and parse problems yield an
/// empty sequence.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch entries of `url` in the feed's native order.
    async fn fetch(&self, url: &str) -> Vec<FeedEntry>;
}

/// Fetch one feed variant, reversing chronological listings so the
/// oldest entry comes first.
pub async fn fetch_variant(fetcher: &dyn FeedFetcher, feed: &FeedVariant) -> Vec<FeedEntry> {
    let mut entries = fetcher.fetch(&feed.url).await;
    if feed.chronological {
        entries.reverse();
    }
    entries
}

/// HTTP feed fetcher backed by reqwest and feed-rs.
pub struct HttpFeedFetcher {
    client: Client,
    headers: Vec<(String, String)>,
    timeout: Duration,
}

impl HttpFeedFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().gzip(true).build()?;

        Ok(Self {
            client,
            headers: build_headers(user_agent),
            timeout,
        })
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let mut request = self.client.get(url).timeout(self.timeout);

        for (key, value) in &self.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await?.error_for_status()?;
        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Vec<FeedEntry> {
        debug!(url = url, "feed_fetch_starting");

        let body = match self.fetch_bytes(url).await {
            Ok(body) => body,
            Err(e) => {
                if e.is_timeout() {
                    warn!(url = url, error = %e, "feed_fetch_timeout");
                } else {
                    warn!(
                        url = url,
                        status_code = e.status().map(|s| s.as_u16()),
                        error = %e,
                        "feed_fetch_error"
                    );
                }
                return Vec::new();
            }
        };

        match parse_feed(&body) {
            Ok(entries) => {
                info!(url = url, body_length = body.len(), entries = entries.len(), "feed_fetch_complete");
                entries
            }
            Err(e) => {
                warn!(url = url, body_length = body.len(), error = %e, "feed_parse_error");
                Vec::new()
            }
        }
    }
}

/// Parse an RSS or Atom document into normalised entries.
///
/// Entries without an `<id>`/`<guid>` keep an empty id so that
/// [`FeedEntry::identifier`] falls back to the link or title. feed-rs would
/// otherwise synthesise a hash or a random UUID that changes between runs.
pub fn parse_feed(body: &[u8]) -> Result<Vec<FeedEntry>, parser::ParseFeedError> {
    let feed = parser::Builder::new()
        .id_generator(|_, _, _| String::new())
        .build()
        .parse(body)?;
    Ok(feed.entries.into_iter().map(normalize_entry).collect())
}

fn normalize_entry(entry: feed_rs::model::Entry) -> FeedEntry {
    let id = Some(entry.id).filter(|id| !id.trim().is_empty());

    let link = entry
        .links
        .iter()
        .map(|l| l.href.trim())
        .find(|href| !href.is_empty())
        .map(str::to_string);

    let tags = entry
        .categories
        .into_iter()
        .map(|c| c.term)
        .filter(|term| !term.is_empty())
        .collect();

    let media_content = entry
        .media
        .iter()
        .flat_map(|media| media.content.iter())
        .filter_map(|content| content.url.as_ref())
        .map(|url| MediaContent::new(url.as_str()))
        .collect();

    let content = entry
        .content
        .and_then(|c| c.body)
        .filter(|body| !body.is_empty())
        .into_iter()
        .collect();

    FeedEntry {
        id,
        title: entry.title.map(|t| t.content),
        link,
        tags,
        keywords: None,
        media_content,
        content,
        summary: entry.summary.map(|s| s.content),
    }
}
