//! Rate limiter trait for abstracting where counters live.

use async_trait::async_trait;

use super::clock::Clock;
use super::counter::{Decision, Quota};
use super::limiter::RateLimiter;
use crate::error::Result;

/// Trait for rate limiter implementations.
///
/// The HTTP handlers only talk to this trait. The in-process
/// [`RateLimiter`] holds counters for a single instance; running several
/// instances behind a load balancer needs an implementation backed by a
/// shared counter store with atomic increment-and-expire.
#[async_trait]
pub trait RateLimiterBackend: Send + Sync {
    /// Check whether an operation under `key` may proceed under `quota`.
    async fn check(&self, key: &str, quota: Quota) -> Result<Decision>;

    /// Current time in milliseconds since the epoch, as the backend sees it.
    fn now_ms(&self) -> i64;
}

#[async_trait]
impl<C: Clock + 'static> RateLimiterBackend for RateLimiter<C> {
    async fn check(&self, key: &str, quota: Quota) -> Result<Decision> {
        self.check_quota(key, quota)
    }

    fn now_ms(&self) -> i64 {
        self.clock().now_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::clock::ManualClock;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_backend_delegates_to_limiter() {
        let clock = Arc::new(ManualClock::new(10_000));
        let backend: Arc<dyn RateLimiterBackend> =
            Arc::new(RateLimiter::with_clock(clock.clone()));
        let quota = Quota::new(1, 1000).unwrap();

        let first = backend.check("client:reviews", quota).await.unwrap();
        assert!(first.ok);
        assert_eq!(first.reset_at, 11_000);

        let second = backend.check("client:reviews", quota).await.unwrap();
        assert!(!second.ok);

        clock.advance(500);
        assert_eq!(backend.now_ms(), 10_500);
    }
}
