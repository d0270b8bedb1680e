//! Webhook wire types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum embeds carried by one webhook message.
pub const EMBEDS_PER_MESSAGE: usize = 10;

/// Accent color of every embed (red).
pub const EMBED_COLOR: u32 = 0xFF0000;

/// Terminal failure delivering one chunk.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("webhook returned HTTP {status}")]
    Status { status: u16 },
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// JSON body posted to the webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub content: String,
    pub embeds: Vec<Embed>,
    pub allowed_mentions: AllowedMentions,
}

impl WebhookPayload {
    /// One image embed per URL, mentions disabled.
    pub fn for_images(urls: &[String]) -> Self {
        Self {
            content: String::new(),
            embeds: urls.iter().map(|u| Embed::image(u)).collect(),
            allowed_mentions: AllowedMentions::none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub color: u32,
    pub image: EmbedImage,
}

impl Embed {
    pub fn image(url: &str) -> Self {
        Self {
            color: EMBED_COLOR,
            image: EmbedImage {
                url: url.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
}

impl AllowedMentions {
    pub fn none() -> Self {
        Self { parse: Vec::new() }
    }
}
