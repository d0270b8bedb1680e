//! Pacing delays between network calls.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

/// Something that can wait for a given duration.
///
/// All deliberate delays in a run (between sources, between webhook
/// chunks, rate-limit backoff) go through this seam.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Pacer that sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            sleep(duration).await;
        }
    }
}
