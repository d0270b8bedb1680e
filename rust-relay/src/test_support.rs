//! In-memory fakes for the network and timer seams.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::dispatch::{DispatchError, PostOutcome, WebhookPayload, WebhookTransport};
use crate::feed::{FeedEntry, FeedFetcher, MediaContent};
use crate::util::Pacer;

/// Feeds served from memory, keyed by URL. Unknown URLs are empty.
#[derive(Default)]
pub struct StaticFeeds {
    feeds: Mutex<HashMap<String, Vec<FeedEntry>>>,
    pub requested: Mutex<Vec<String>>,
}

impl StaticFeeds {
    pub fn set(&self, url: &str, entries: Vec<FeedEntry>) {
        self.feeds.lock().unwrap().insert(url.to_string(), entries);
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedFetcher for StaticFeeds {
    async fn fetch(&self, url: &str) -> Vec<FeedEntry> {
        self.requested.lock().unwrap().push(url.to_string());
        self.feeds.lock().unwrap().get(url).cloned().unwrap_or_default()
    }
}

pub enum Scripted {
    Ok,
    RateLimit(Duration),
    Status(u16),
}

/// Transport that replays scripted responses and records payloads.
/// Once the script runs out every post succeeds.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    pub posts: Mutex<Vec<(String, WebhookPayload)>>,
}

impl ScriptedTransport {
    pub fn with_script(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            posts: Mutex::new(Vec::new()),
        }
    }

    pub fn post_sizes(&self) -> Vec<usize> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.embeds.len())
            .collect()
    }

    /// Every delivered image URL, in post order.
    pub fn image_urls(&self) -> Vec<String> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, p)| p.embeds.iter().map(|e| e.image.url.clone()))
            .collect()
    }
}

#[async_trait]
impl WebhookTransport for ScriptedTransport {
    async fn post(&self, webhook: &str, payload: &WebhookPayload) -> PostOutcome {
        self.posts
            .lock()
            .unwrap()
            .push((webhook.to_string(), payload.clone()));
        match self.script.lock().unwrap().pop_front().unwrap_or(Scripted::Ok) {
            Scripted::Ok => PostOutcome::Delivered,
            Scripted::RateLimit(d) => PostOutcome::RateLimited { retry_after: d },
            Scripted::Status(status) => PostOutcome::Failed(DispatchError::Status { status }),
        }
    }
}

/// Pacer that records pauses instead of sleeping.
#[derive(Default)]
pub struct RecordingPacer {
    pub pauses: Mutex<Vec<Duration>>,
}

impl RecordingPacer {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}

/// Entry with an id, a title and a single image in `media:content`.
pub fn image_entry(id: &str, title: &str, image_url: &str) -> FeedEntry {
    FeedEntry {
        id: Some(id.to_string()),
        title: Some(title.to_string()),
        media_content: vec![MediaContent::new(image_url)],
        ..Default::default()
    }
}
