//! Source configuration and feed variant resolution.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One entry of the `BOT_CONFIG` list, exactly as the operator wrote it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Subreddit name (without the `r/` prefix)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subreddit: Option<String>,
    /// Arbitrary RSS/Atom feed URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rss_url: Option<String>,
    /// Delivery webhook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<String>,
}

impl SourceConfig {
    /// Decode one element of the source list.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    pub fn subreddit(name: &str, webhook: &str) -> Self {
        Self {
            subreddit: Some(name.to_string()),
            rss_url: None,
            webhook: Some(webhook.to_string()),
        }
    }

    pub fn rss(url: &str, webhook: &str) -> Self {
        Self {
            subreddit: None,
            rss_url: Some(url.to_string()),
            webhook: Some(webhook.to_string()),
        }
    }

    /// Resolve the feed target. A subreddit wins over an RSS URL.
    pub fn kind(&self) -> Option<SourceKind> {
        if let Some(sub) = non_blank(&self.subreddit) {
            return Some(SourceKind::Reddit(sub.to_string()));
        }
        non_blank(&self.rss_url).map(|url| SourceKind::Rss(url.to_string()))
    }

    pub fn webhook(&self) -> Option<&str> {
        non_blank(&self.webhook)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// What a source polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Reddit(String),
    Rss(String),
}

impl SourceKind {
    /// Storage key for this source's seen-list.
    ///
    /// Stable across restarts: generic feeds use a SHA-256 prefix of the URL.
    pub fn source_id(&self) -> String {
        match self {
            SourceKind::Reddit(sub) => format!("reddit_{}", sub),
            SourceKind::Rss(url) => {
                let mut hasher = Sha256::new();
                hasher.update(url.as_bytes());
                let digest = hex::encode(hasher.finalize());
                format!("rss_{}", &digest[..16])
            }
        }
    }

    /// Short label for log events.
    pub fn label(&self) -> String {
        match self {
            SourceKind::Reddit(sub) => format!("r/{}", sub),
            SourceKind::Rss(url) => url.clone(),
        }
    }

    /// Feed variants to poll, in processing order.
    pub fn feeds(&self, reddit_base_url: &str, top_window: TopWindow) -> Vec<FeedVariant> {
        match self {
            SourceKind::Reddit(sub) => vec![
                FeedVariant {
                    url: format!("{}/r/{}/new/.rss", reddit_base_url, sub),
                    chronological: true,
                },
                FeedVariant {
                    url: format!("{}/r/{}/hot/.rss", reddit_base_url, sub),
                    chronological: false,
                },
                FeedVariant {
                    url: format!("{}/r/{}/top/.rss?t={}", reddit_base_url, sub, top_window.as_str()),
                    chronological: false,
                },
            ],
            SourceKind::Rss(url) => vec![FeedVariant {
                url: url.clone(),
                chronological: true,
            }],
        }
    }
}

/// A single feed URL plus whether its native order is newest-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedVariant {
    pub url: String,
    /// Newest-first listing; entries are reversed before evaluation
    pub chronological: bool,
}

/// Time window for the reddit `top` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopWindow {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TopWindow {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "hour" => Some(TopWindow::Hour),
            "day" => Some(TopWindow::Day),
            "week" => Some(TopWindow::Week),
            "month" => Some(TopWindow::Month),
            "year" => Some(TopWindow::Year),
            "all" => Some(TopWindow::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TopWindow::Hour => "hour",
            TopWindow::Day => "day",
            TopWindow::Week => "week",
            TopWindow::Month => "month",
            TopWindow::Year => "year",
            TopWindow::All => "all",
        }
    }
}
