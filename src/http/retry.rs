//! Rate-limit retry policy
//!
//! Only HTTP 429 is retried. The wait comes from the `Retry-After` header
//! (whole seconds) or a fixed default, and the same request is re-sent until
//! the service stops throttling. Every other status fails fast.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Wait used when the service sends no usable `Retry-After` header
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(2);

/// Compute the rate-limit delay from response headers
pub fn retry_after(headers: &HeaderMap, default: Duration) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

/// Per-request retry bookkeeping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryContext {
    /// Number of rate-limited attempts so far
    pub attempt: u32,
    /// Delay computed for the latest attempt
    pub delay: Duration,
}

impl RetryContext {
    /// Create a fresh context
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rate-limited attempt and the delay before the next one
    pub fn record(&mut self, delay: Duration) {
        self.attempt += 1;
        self.delay = delay;
    }
}

/// Source of backoff waits
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for the given duration
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that records requested waits and returns immediately
///
/// Clones share the same log, so a handle kept by a test sees the waits made
/// through a fetcher.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All waits requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Sum of all waits requested so far
    pub fn total(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}

impl fmt::Debug for RecordingSleeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingSleeper")
            .field("sleeps", &self.sleeps())
            .finish()
    }
}

#[cfg(test)]
mod retry_tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use test_case::test_case;

    fn headers(value: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(RETRY_AFTER, HeaderValue::from_static(value));
        }
        headers
    }

    #[test_case(Some("3"), 3 ; "seconds")]
    #[test_case(Some(" 7 "), 7 ; "padded")]
    #[test_case(Some("0"), 0 ; "zero")]
    #[test_case(None, 2 ; "missing")]
    #[test_case(Some("soon"), 2 ; "not a number")]
    #[test_case(Some("-5"), 2 ; "negative")]
    #[test_case(Some("1.5"), 2 ; "fractional")]
    #[test_case(Some("Wed, 21 Oct 2015 07:28:00 GMT"), 2 ; "http date")]
    fn test_retry_after(value: Option<&'static str>, expected_secs: u64) {
        assert_eq!(
            retry_after(&headers(value), DEFAULT_RETRY_AFTER),
            Duration::from_secs(expected_secs)
        );
    }

    #[test]
    fn test_retry_context_record() {
        let mut ctx = RetryContext::new();
        assert_eq!(ctx.attempt, 0);

        ctx.record(Duration::from_secs(3));
        ctx.record(Duration::from_secs(2));
        assert_eq!(ctx.attempt, 2);
        assert_eq!(ctx.delay, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_recording_sleeper_shares_log() {
        let sleeper = RecordingSleeper::new();
        let handle = sleeper.clone();

        sleeper.sleep(Duration::from_secs(3)).await;
        sleeper.sleep(Duration::from_secs(2)).await;

        assert_eq!(
            handle.sleeps(),
            vec![Duration::from_secs(3), Duration::from_secs(2)]
        );
        assert_eq!(handle.total(), Duration::from_secs(5));
    }
}
