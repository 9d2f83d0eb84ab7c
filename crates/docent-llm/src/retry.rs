use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

use crate::error::LlmError;

/// Upper bound on the backoff exponent: waits never exceed 64s without a server hint.
const MAX_BACKOFF_SHIFT: u32 = 6;

/// Seconds from a numeric `Retry-After` header, else `2^attempt` seconds.
pub(crate) fn backoff(headers: &HeaderMap, attempt: u32) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or_else(
            || Duration::from_secs(1_u64 << attempt.min(MAX_BACKOFF_SHIFT)),
            Duration::from_secs,
        )
}

/// Issue the request built by `send`, re-sending after a pause while the server answers 429.
///
/// # Errors
///
/// Returns `LlmError::RateLimited` once `max_retries` re-sends were all rate limited, or
/// `LlmError::Http` when the request itself fails.
pub(crate) async fn send_with_retry<F, Fut>(
    provider: &str,
    max_retries: u32,
    mut send: F,
) -> Result<reqwest::Response, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut attempt = 0;
    loop {
        let response = send().await?;
        if response.status() != StatusCode::TOO_MANY_REQUESTS {
            return Ok(response);
        }
        if attempt >= max_retries {
            tracing::warn!(provider, attempts = attempt + 1, "rate limit persisted, giving up");
            return Err(LlmError::RateLimited);
        }

        let delay = backoff(response.headers(), attempt);
        tracing::warn!(
            provider,
            delay_secs = delay.as_secs(),
            retry = attempt + 1,
            max_retries,
            "rate limited"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
