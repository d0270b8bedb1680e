//! Feed fetching and entry records.

pub mod fetcher;
pub mod types;

pub use fetcher::{fetch_variant, parse_feed, FeedFetcher, HttpFeedFetcher};
pub use types::{FeedEntry, MediaContent, UNKNOWN_IDENTIFIER};
