//! Chunked delivery with rate-limit backoff.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::transport::{PostOutcome, WebhookTransport};
use super::types::{DispatchError, WebhookPayload, EMBEDS_PER_MESSAGE};
use crate::util::Pacer;

/// Timing knobs for delivery.
#[derive(Debug, Clone, Copy)]
pub struct DispatchSettings {
    /// Pause between consecutive chunks
    pub batch_delay: Duration,
    /// Upper bound on a single rate-limit wait
    pub retry_after_ceiling: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            batch_delay: Duration::from_secs(1),
            retry_after_ceiling: Duration::from_secs(60),
        }
    }
}

/// Outcome of delivering one source's images.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub chunks_delivered: usize,
    pub chunks_failed: usize,
    pub images_delivered: usize,
    pub rate_limit_waits: usize,
}

/// Splits image URLs into webhook messages and posts them in order.
pub struct BatchDispatcher {
    transport: Arc<dyn WebhookTransport>,
    pacer: Arc<dyn Pacer>,
    settings: DispatchSettings,
}

impl BatchDispatcher {
    pub fn new(
        transport: Arc<dyn WebhookTransport>,
        pacer: Arc<dyn Pacer>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            transport,
            pacer,
            settings,
        }
    }

    /// Deliver `urls` to `webhook` in chunks of [`EMBEDS_PER_MESSAGE`].
    ///
    /// A chunk that fails with anything but 429 is logged and dropped;
    /// later chunks are still attempted.
    pub async fn deliver(&self, webhook: &str, urls: &[String]) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let total_chunks = urls.len().div_ceil(EMBEDS_PER_MESSAGE);

        for (index, chunk) in urls.chunks(EMBEDS_PER_MESSAGE).enumerate() {
            if index > 0 {
                self.pacer.pause(self.settings.batch_delay).await;
            }

            let payload = WebhookPayload::for_images(chunk);

            match self.post_with_backoff(webhook, &payload, &mut report).await {
                Ok(()) => {
                    report.chunks_delivered += 1;
                    report.images_delivered += chunk.len();
                    info!(
                        chunk_index = index,
                        total_chunks = total_chunks,
                        images = chunk.len(),
                        "webhook_chunk_delivered"
                    );
                }
                Err(e) => {
                    report.chunks_failed += 1;
                    error!(
                        chunk_index = index,
                        total_chunks = total_chunks,
                        images = chunk.len(),
                        error = %e,
                        "webhook_chunk_dropped"
                    );
                }
            }
        }

        report
    }

    /// Post one payload, waiting out 429 responses for as long as the
    /// webhook keeps sending them.
    async fn post_with_backoff(
        &self,
        webhook: &str,
        payload: &WebhookPayload,
        report: &mut DeliveryReport,
    ) -> Result<(), DispatchError> {
        loop {
            match self.transport.post(webhook, payload).await {
                PostOutcome::Delivered => return Ok(()),
                PostOutcome::RateLimited { retry_after } => {
                    let wait = retry_after.min(self.settings.retry_after_ceiling);
                    report.rate_limit_waits += 1;
                    warn!(
                        retry_after_seconds = retry_after.as_secs_f64(),
                        wait_seconds = wait.as_secs_f64(),
                        attempt = report.rate_limit_waits,
                        "webhook_rate_limited"
                    );
                    self.pacer.pause(wait).await;
                }
                PostOutcome::Failed(e) => return Err(e),
            }
        }
    }
}
