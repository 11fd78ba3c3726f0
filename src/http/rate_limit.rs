//! Request pacing
//!
//! Uses the governor crate to enforce a self-imposed minimum interval
//! between requests. Each paginator owns its own pacer; nothing here is
//! shared across sources.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::time::Duration;

/// At most one request per `interval`
pub struct RequestPacer {
    limiter: Option<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
    interval: Duration,
}

impl RequestPacer {
    /// Create a pacer allowing one request per `interval`. A zero interval
    /// disables pacing.
    pub fn new(interval: Duration) -> Self {
        let limiter = Quota::with_period(interval)
            .map(|quota| Governor::direct(quota.allow_burst(NonZeroU32::MIN)));

        Self { limiter, interval }
    }

    /// A pacer that never waits
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Wait until the next request is allowed. The first request never waits.
    pub async fn wait(&self) {
        if let Some(ref limiter) = self.limiter {
            limiter.until_ready().await;
        }
    }

}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("interval", &self.interval)
            .finish()
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_zero_interval_disables_pacing() {
        let pacer = RequestPacer::new(Duration::ZERO);
        assert!(pacer.limiter.is_none());

        let start = Instant::now();
        for _ in 0..10 {
            pacer.wait().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_one_request_per_interval() {
        let pacer = RequestPacer::new(Duration::from_secs(60));
        let limiter = pacer.limiter.as_ref().unwrap();

        // First request goes through, the second must wait a full minute
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());
    }

    #[tokio::test]
    async fn test_first_wait_is_immediate() {
        let pacer = RequestPacer::new(Duration::from_secs(60));
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_second_wait_is_delayed() {
        let pacer = RequestPacer::new(Duration::from_millis(50));
        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
