//! Exponential backoff for registry HTTP calls.
//!
//! Only failures to reach the registry (refused connections, timeouts) are
//! retried. Anything else, including a request that could not be built,
//! goes straight back to the caller. Status codes are the caller's concern.

use std::time::Duration;

/// Retries after the first attempt.
const MAX_RETRIES: u32 = 3;

/// First retry delay; doubles each time (200ms, 400ms, 800ms).
const BASE_DELAY_MS: u64 = 200;

/// Whether another attempt could succeed where this one failed.
fn is_transient(err: &reqwest::Error) -> bool {
    !err.is_builder() && (err.is_connect() || err.is_timeout())
}

fn backoff(retry: u32) -> Duration {
    Duration::from_millis(BASE_DELAY_MS << retry)
}

/// Send a request, retrying transient failures with exponential backoff.
pub(crate) async fn retry_send<F, Fut>(
    endpoint: &str,
    f: F,
) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    let mut retry = 0;
    loop {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) if retry < MAX_RETRIES && is_transient(&e) => {
                let delay = backoff(retry);
                retry += 1;
                tracing::warn!(
                    endpoint,
                    retry,
                    max_retries = MAX_RETRIES,
                    "registry unreachable, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::debug!(endpoint, retries = retry, "registry request failed: {e}");
                return Err(e);
            }
        }
    }
}
