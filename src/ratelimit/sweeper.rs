//! Background eviction of expired counter entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::clock::Clock;
use super::limiter::RateLimiter;

/// Spawn a task that sweeps `limiter` every `interval`.
///
/// Entries whose window ended more than `grace_ms` ago are removed. The task
/// exits once `shutdown` flips to `true` or its sender is dropped.
pub fn spawn_sweeper<C: Clock + 'static>(
    limiter: Arc<RateLimiter<C>>,
    interval: Duration,
    grace_ms: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        info!(
            interval_ms = interval.as_millis() as u64,
            grace_ms = grace_ms,
            "Rate limit sweeper started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = limiter.sweep(grace_ms);
                    if removed > 0 {
                        debug!(
                            removed = removed,
                            remaining = limiter.len(),
                            "Swept expired rate limit entries"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Rate limit sweeper stopped");
    })
}
