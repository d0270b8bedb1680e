//! FeedRelay - batch feed poller that relays new images to a webhook.
//!
//! One invocation is one pass over every configured source:
//!
//! ```text
//! BOT_CONFIG → SourceProcessor per source → fetch → filter → extract → state → webhook
//! ```
//!
//! State is loaded once at the start of the run and saved once at the end.

pub mod config;
pub mod dispatch;
pub mod feed;
pub mod filter;
pub mod html;
pub mod media;
pub mod processor;
pub mod runner;
pub mod source;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::{parse_sources, Config, ConfigError};
pub use dispatch::{BatchDispatcher, DeliveryReport, DispatchSettings, WebhookPayload};
pub use feed::{FeedEntry, FeedFetcher, HttpFeedFetcher, MediaContent};
pub use filter::is_blocked;
pub use media::pick_media;
pub use processor::{ProcessorSettings, SourceOutcome, SourceProcessor, SourceReport};
pub use runner::{run, Relay, RunSummary};
pub use source::{SourceConfig, SourceKind, TopWindow};
pub use state::{SeenState, StateStore, MAX_HISTORY};
