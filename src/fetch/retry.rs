//! Retry/back-off policy (spec.md §4.3): exponential back-off with
//! jitter for 408/429/5xx and connection errors, capped attempts, and a
//! 429-triggered cooldown flag surfaced to the scheduler.

use std::time::Duration;

use rand::Rng;

use crate::error::FetchError;
use crate::utils::{DEFAULT_MAX_RETRIES, RETRY_BASE_DELAY_SECS, RETRY_CAP_SECS, RETRY_FACTOR};

/// `base(1s) * factor(2)^attempt`, capped at 60s, with up to ±20% jitter
/// to avoid synchronized retries across concurrent sessions.
#[must_use]
pub fn backoff_delay(attempt: u32) -> Duration {
    let raw = RETRY_BASE_DELAY_SECS * RETRY_FACTOR.powi(attempt as i32);
    let capped = raw.min(RETRY_CAP_SECS);
    let jitter = capped * 0.2;
    let jittered = capped + rand::rng().random_range(-jitter..=jitter);
    Duration::from_secs_f64(jittered.max(0.0))
}

/// Drive `attempt_fetch` through the retry policy. Returns the first
/// success, or the last error once retries are exhausted or the error is
/// not retryable.
pub async fn with_retry<F, Fut>(mut attempt_fetch: F) -> (Result<crate::fetch::RawResponse, FetchError>, u32)
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<crate::fetch::RawResponse, FetchError>>,
{
    let mut attempt = 0;
    loop {
        let result = attempt_fetch(attempt).await;
        match &result {
            Ok(_) => return (result, attempt),
            Err(err) if err.is_retryable() && attempt < DEFAULT_MAX_RETRIES => {
                let delay = backoff_delay(attempt);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(_) => return (result, attempt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_capped() {
        for attempt in 0..10 {
            let delay = backoff_delay(attempt);
            assert!(delay <= Duration::from_secs_f64(RETRY_CAP_SECS * 1.2));
        }
    }

    #[test]
    fn backoff_grows_with_attempt() {
        let first = backoff_delay(0).as_secs_f64();
        let third = backoff_delay(3).as_secs_f64();
        assert!(third > first);
    }
}
