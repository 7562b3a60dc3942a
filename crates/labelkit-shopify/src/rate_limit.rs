//! Retry with exponential backoff for Admin API throttling.
//!
//! Shopify signals throttling two ways: HTTP 429 on the REST-style rate
//! limiter, and a `THROTTLED` GraphQL error (HTTP 200) when the query cost
//! bucket is empty. Both are retried, as are network failures and 5xx
//! responses. Everything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ShopifyError;

fn is_retriable(err: &ShopifyError) -> bool {
    match err {
        ShopifyError::RateLimited { .. }
        | ShopifyError::Throttled { .. }
        | ShopifyError::Http(_) => true,
        ShopifyError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Runs `operation`, sleeping `backoff_base_secs * 2^attempt` seconds between
/// attempts on retriable errors. At most `max_retries` retries follow the
/// first try; the last error is returned once they are exhausted.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ShopifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ShopifyError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "admin API throttled or unavailable, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
