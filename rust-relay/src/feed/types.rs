//! Normalised feed entry record.

/// Identifier used when an entry carries no id, link or title.
pub const UNKNOWN_IDENTIFIER: &str = "unknown";

/// One item of a fetched feed. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    /// Category terms
    pub tags: Vec<String>,
    /// Comma-delimited keyword string, consulted only when `tags` is empty
    pub keywords: Option<String>,
    /// `media:content` descriptors
    pub media_content: Vec<MediaContent>,
    /// HTML content blobs
    pub content: Vec<String>,
    /// HTML summary blob
    pub summary: Option<String>,
}

/// A media descriptor attached to an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaContent {
    pub url: Option<String>,
}

impl MediaContent {
    pub fn new(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
        }
    }
}

impl FeedEntry {
    /// Dedup key: first non-blank of `id`, `link`, `title`.
    pub fn identifier(&self) -> String {
        [&self.id, &self.link, &self.title]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|value| !value.trim().is_empty())
            .unwrap_or(UNKNOWN_IDENTIFIER)
            .to_string()
    }
}
