//! Webhook HTTP transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, error};

use super::types::{DispatchError, WebhookPayload};

/// Wait used when a 429 body carries no usable `retry_after`.
pub const DEFAULT_RETRY_AFTER_SECS: f64 = 1.0;

/// Result of a single webhook post.
#[derive(Debug)]
pub enum PostOutcome {
    /// 2xx response
    Delivered,
    /// 429 response; the same payload should be retried after the delay
    RateLimited { retry_after: Duration },
    /// Any other failure; the payload is abandoned
    Failed(DispatchError),
}

/// Posts one payload to one webhook, without retrying.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post(&self, webhook: &str, payload: &WebhookPayload) -> PostOutcome;
}

/// reqwest-backed transport with a fixed per-request timeout.
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl WebhookTransport for ReqwestTransport {
    async fn post(&self, webhook: &str, payload: &WebhookPayload) -> PostOutcome {
        let response = match self
            .client
            .post(webhook)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_timeout() {
                    error!(
                        timeout_seconds = self.timeout.as_secs_f64(),
                        error = %e,
                        "webhook_post_timeout"
                    );
                } else {
                    error!(error = %e, "webhook_post_request_error");
                }
                return PostOutcome::Failed(DispatchError::Http(e));
            }
        };

        let status = response.status();
        debug!(status_code = status.as_u16(), embeds = payload.embeds.len(), "webhook_post_response");

        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return PostOutcome::RateLimited {
                retry_after: parse_retry_after(&body),
            };
        }

        if status.is_success() {
            PostOutcome::Delivered
        } else {
            PostOutcome::Failed(DispatchError::Status {
                status: status.as_u16(),
            })
        }
    }
}

/// Read the numeric `retry_after` (seconds) from a 429 response body.
///
/// Missing, negative or unparseable values fall back to one second.
/// Values too large for a [`Duration`] saturate; the dispatcher caps them.
pub fn parse_retry_after(body: &str) -> Duration {
    let seconds = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("retry_after").and_then(retry_after_seconds))
        .filter(|s| !s.is_nan() && *s >= 0.0)
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);

    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

fn retry_after_seconds(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_after_number() {
        assert_eq!(parse_retry_after(r#"{"retry_after": 2}"#), Duration::from_secs(2));
        assert_eq!(
            parse_retry_after(r#"{"message": "You are being rate limited.", "retry_after": 0.75, "global": false}"#),
            Duration::from_millis(750)
        );
    }

    #[test]
    fn test_parse_retry_after_numeric_string() {
        assert_eq!(parse_retry_after(r#"{"retry_after": "3.5"}"#), Duration::from_millis(3500));
    }

    #[test]
    fn test_parse_retry_after_defaults() {
        let one = Duration::from_secs(1);
        assert_eq!(parse_retry_after(""), one);
        assert_eq!(parse_retry_after("<html>slow down</html>"), one);
        assert_eq!(parse_retry_after(r#"{"message": "rate limited"}"#), one);
        assert_eq!(parse_retry_after(r#"{"retry_after": -4}"#), one);
        assert_eq!(parse_retry_after(r#"{"retry_after": "soon"}"#), one);
        assert_eq!(parse_retry_after(r#"{"retry_after": null}"#), one);
    }

    #[test]
    fn test_parse_retry_after_huge_value_saturates() {
        assert_eq!(parse_retry_after(r#"{"retry_after": 1e300}"#), Duration::MAX);
    }
}
