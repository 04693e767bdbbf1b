//! Request pacing and retry for page fetches.
//!
//! Every request is preceded by a random pause drawn from the site's delay
//! range. Transient failures are retried after a random pause drawn from the
//! retry range; anything else is returned at once.

use std::future::Future;
use std::time::Duration;

use dealcrawl_core::DelayRange;

use crate::error::ScraperError;

/// Returns `true` if `err` is worth another attempt.
///
/// Retriable errors:
/// - [`ScraperError::Forbidden`]: HTTP 403, usually bot detection that clears
///   after a pause.
/// - [`ScraperError::Http`] for timeouts, connection failures and truncated
///   bodies.
///
/// Other statuses and invalid URLs are returned immediately.
pub(crate) fn is_retriable(err: &ScraperError) -> bool {
    match err {
        ScraperError::Forbidden { .. } => true,
        ScraperError::Http(e) => e.is_timeout() || e.is_connect() || e.is_body(),
        ScraperError::UnexpectedStatus { .. } | ScraperError::InvalidUrl { .. } => false,
    }
}

/// A duration drawn uniformly from `range`.
pub(crate) fn random_delay(range: DelayRange) -> Duration {
    if range.is_zero() {
        return Duration::ZERO;
    }
    let spread = (range.max_secs - range.min_secs).max(0.0);
    let secs = range.min_secs.max(0.0) + rand::random::<f64>() * spread;
    Duration::try_from_secs_f64(secs).unwrap_or_default()
}

/// Sleeps for a random duration from `range`. Returns at once for a zero range.
pub(crate) async fn pause(range: DelayRange) {
    let delay = random_delay(range);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Executes `operation`, retrying transient errors up to `max_retries` times.
///
/// With `max_retries = 2` the operation runs at most 3 times. The last error
/// is returned once retries are exhausted.
pub(crate) async fn retry_with_jitter<T, F, Fut>(
    max_retries: u32,
    retry_delay: DelayRange,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let delay = random_delay(retry_delay);
        tracing::warn!(
            attempt = attempt + 1,
            max_retries,
            delay_secs = delay.as_secs_f64(),
            error = %err,
            "transient fetch error, retrying"
        );
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn forbidden() -> ScraperError {
        ScraperError::Forbidden {
            url: "https://shop.example/item".to_owned(),
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_jitter(3, DelayRange::zero(), || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ScraperError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_forbidden_then_succeeds() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_jitter(3, DelayRange::zero(), || {
            let cc = Arc::clone(&cc);
            async move {
                let n = cc.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(forbidden())
                } else {
                    Ok::<u32, ScraperError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_last_error_after_exhausting_retries() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_jitter(2, DelayRange::zero(), || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(forbidden())
            }
        })
        .await;
        // max_retries=2 → 3 total attempts
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ScraperError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_unexpected_status() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = Arc::clone(&call_count);
        let result = retry_with_jitter(3, DelayRange::zero(), || {
            let cc = Arc::clone(&cc);
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                Err::<u32, ScraperError>(ScraperError::UnexpectedStatus {
                    status: 404,
                    url: "https://shop.example/missing".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(ScraperError::UnexpectedStatus { status: 404, .. })
        ));
    }

    #[test]
    fn random_delay_stays_in_range() {
        let range = DelayRange::new(0.5, 1.5);
        for _ in 0..100 {
            let delay = random_delay(range).as_secs_f64();
            assert!((0.5..=1.5).contains(&delay), "delay {delay} out of range");
        }
    }

    #[test]
    fn zero_range_never_sleeps() {
        assert_eq!(random_delay(DelayRange::zero()), Duration::ZERO);
    }
}
