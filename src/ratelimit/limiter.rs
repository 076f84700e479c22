//! Core rate limiter implementation.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::clock::{Clock, SystemClock};
use super::counter::{Decision, Entry, Quota};
use crate::error::{Result, RiverdaleError};

/// The core rate limiter: a process-wide fixed-window counter store.
///
/// This struct is thread-safe and can be shared across multiple tasks. The
/// read-modify-write of a key runs under that key's shard lock, so
/// concurrent checks on one key never admit more than the quota allows.
pub struct RateLimiter<C: Clock = SystemClock> {
    /// Counter entries indexed by key
    entries: DashMap<String, Entry>,
    /// Time source for window boundaries
    clock: C,
    /// Hard bound on the number of tracked keys
    capacity: Option<usize>,
    /// Window ends in eviction order, only kept when bounded
    eviction: Option<Mutex<EvictionIndex>>,
}

/// Min-heap of `(reset_at, key)`, one item per opened window.
///
/// Items go stale when their key opens a newer window or is removed; a
/// stale item no longer matches the stored entry and is skipped on pop.
type EvictionIndex = BinaryHeap<Reverse<(i64, String)>>;

impl RateLimiter<SystemClock> {
    /// Create a new rate limiter on the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for RateLimiter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a rate limiter with an unbounded store on the given clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            capacity: None,
            eviction: None,
        }
    }

    /// Create a rate limiter that tracks at most `capacity` keys.
    ///
    /// A new key arriving at capacity evicts the entry whose window ends
    /// first, which is an expired one whenever any exists. Eviction pops a
    /// heap of window ends, so it never scans the store.
    pub fn with_capacity_limit(clock: C, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(RiverdaleError::InvalidArgument(
                "capacity must be a positive integer".to_string(),
            ));
        }
        Ok(Self {
            entries: DashMap::new(),
            clock,
            capacity: Some(capacity),
            eviction: Some(Mutex::new(BinaryHeap::new())),
        })
    }

    /// Check whether an operation under `key` may proceed.
    ///
    /// Admits at most `max` operations per `window_ms`-long fixed window.
    /// An empty key or a zero `max`/`window_ms` is a contract violation and
    /// fails fast with [`RiverdaleError::InvalidArgument`].
    pub fn check(&self, key: &str, max: u32, window_ms: u64) -> Result<Decision> {
        let quota = Quota::new(max, window_ms)?;
        self.check_quota(key, quota)
    }

    /// Check a key against an already validated quota.
    pub fn check_quota(&self, key: &str, quota: Quota) -> Result<Decision> {
        if key.is_empty() {
            return Err(RiverdaleError::InvalidArgument(
                "rate limit key must not be empty".to_string(),
            ));
        }

        if let Some(capacity) = self.capacity {
            if !self.entries.contains_key(key) {
                self.make_room(capacity);
            }
        }

        let now = self.clock.now_ms();

        trace!(
            key = %key,
            max = quota.max(),
            window_ms = quota.window_ms(),
            "Checking rate limit"
        );

        let (decision, opened) = match self.entries.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                let previous_reset = entry.reset_at;
                let decision = entry.admit(quota, now);
                (decision, entry.reset_at != previous_reset)
            }
            MapEntry::Vacant(vacant) => {
                let entry = vacant.insert(Entry::open(quota, now));
                (Decision::admitted(quota, &entry), true)
            }
        };

        // The shard guard is released above; the index lock is never taken
        // while holding one.
        if opened {
            if let Some(eviction) = &self.eviction {
                eviction
                    .lock()
                    .push(Reverse((decision.reset_at, key.to_string())));
            }
        }

        if !decision.ok {
            debug!(
                key = %key,
                reset_at = decision.reset_at,
                "Rate limit exceeded"
            );
        }

        Ok(decision)
    }

    /// Current counter state for a key, if one is stored.
    ///
    /// The entry may already be expired; expiry is only acted upon by the
    /// next check or a sweep.
    pub fn peek(&self, key: &str) -> Option<Entry> {
        self.entries.get(key).map(|entry| *entry)
    }

    /// Remove entries whose window ended at least `grace_ms` ago.
    ///
    /// Returns the number of entries removed.
    pub fn sweep(&self, grace_ms: u64) -> usize {
        let grace = i64::try_from(grace_ms).unwrap_or(i64::MAX);
        let now = self.clock.now_ms();
        let before = self.entries.len();

        self.entries
            .retain(|_, entry| entry.reset_at.saturating_add(grace) > now);

        if let Some(eviction) = &self.eviction {
            // Every item this old is either stale or was just swept
            let mut index = eviction.lock();
            while let Some(Reverse((reset_at, _))) = index.peek() {
                if reset_at.saturating_add(grace) > now {
                    break;
                }
                index.pop();
            }
        }

        before.saturating_sub(self.entries.len())
    }

    /// Clear all counters.
    pub fn clear(&self) {
        self.entries.clear();
        if let Some(eviction) = &self.eviction {
            eviction.lock().clear();
        }
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The clock this limiter reads.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn make_room(&self, capacity: usize) {
        let Some(eviction) = &self.eviction else {
            return;
        };
        if self.entries.len() < capacity {
            return;
        }

        let now = self.clock.now_ms();
        let mut index = eviction.lock();
        while let Some(Reverse((reset_at, key))) = index.pop() {
            let removed = self
                .entries
                .remove_if(&key, |_, entry| entry.reset_at == reset_at)
                .is_some();
            if !removed {
                continue;
            }

            if reset_at <= now {
                debug!(key = %key, "Evicted expired entry to make room");
            } else {
                warn!(
                    key = %key,
                    capacity = capacity,
                    "Rate limiter at capacity, evicting earliest-resetting entry"
                );
            }
            return;
        }
    }
}
