//! Retry with exponential back-off and jitter for the places client.
//!
//! [`retry_with_backoff`] wraps one request and retries on transient errors
//! (network failures, 5xx, `UNKNOWN_ERROR`). Every other provider status is
//! returned immediately: retrying `REQUEST_DENIED` or `INVALID_REQUEST`
//! cannot succeed and only burns quota.

use std::future::Future;
use std::time::Duration;

use crate::error::GeoError;

const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

/// Returns `true` for errors that are worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &GeoError) -> bool {
    match err {
        GeoError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        GeoError::Status { status, .. } => status == UNKNOWN_ERROR,
        GeoError::NoResults { .. }
        | GeoError::Deserialize { .. }
        | GeoError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Sleep before retry `n` is `backoff_base_ms × 2^(n-1)` ± 25 % jitter,
/// capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, GeoError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GeoError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "places transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
