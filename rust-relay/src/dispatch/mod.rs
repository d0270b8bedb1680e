//! Webhook delivery of image batches.
//!
//! ```text
//! image urls → chunks of 10 → WebhookPayload → WebhookTransport (429 → wait, retry)
//! ```

pub mod batcher;
pub mod transport;
pub mod types;

pub use batcher::{BatchDispatcher, DeliveryReport, DispatchSettings};
pub use transport::{parse_retry_after, PostOutcome, ReqwestTransport, WebhookTransport};
pub use types::{DispatchError, Embed, WebhookPayload, EMBEDS_PER_MESSAGE, EMBED_COLOR};
