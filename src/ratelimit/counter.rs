//! Fixed-window counter state and the admission decision it produces.

use crate::error::{Result, RiverdaleError};

/// How many admissions a key gets per window, and how long a window lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quota {
    max: u32,
    window_ms: u64,
}

impl Quota {
    /// Create a quota, rejecting a zero `max` or a zero-length window.
    pub fn new(max: u32, window_ms: u64) -> Result<Self> {
        if max == 0 {
            return Err(RiverdaleError::InvalidArgument(
                "max must be a positive integer".to_string(),
            ));
        }
        if window_ms == 0 {
            return Err(RiverdaleError::InvalidArgument(
                "window_ms must be a positive integer".to_string(),
            ));
        }
        Ok(Self { max, window_ms })
    }

    /// Maximum admissions per window.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Window length in milliseconds.
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    fn window_ms_i64(&self) -> i64 {
        i64::try_from(self.window_ms).unwrap_or(i64::MAX)
    }
}

/// Counter state for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Admissions granted in the open window (always >= 1)
    pub count: u32,
    /// Milliseconds since the epoch at which the open window ends
    pub reset_at: i64,
}

impl Entry {
    /// Open a fresh window at `now_ms` holding the admission being granted.
    pub fn open(quota: Quota, now_ms: i64) -> Self {
        Self {
            count: 1,
            reset_at: now_ms.saturating_add(quota.window_ms_i64()),
        }
    }

    /// Whether the window this entry describes has ended.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.reset_at <= now_ms
    }

    /// Run one admission check against this entry.
    ///
    /// An expired entry is replaced in place by a fresh window. A denial
    /// leaves the entry untouched.
    pub fn admit(&mut self, quota: Quota, now_ms: i64) -> Decision {
        if self.is_expired(now_ms) {
            *self = Entry::open(quota, now_ms);
            return Decision::admitted(quota, self);
        }

        if self.count < quota.max {
            self.count += 1;
            return Decision::admitted(quota, self);
        }

        Decision::denied(self.reset_at)
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the operation may proceed
    pub ok: bool,
    /// Admissions left in the open window after this one
    pub remaining: u32,
    /// Milliseconds since the epoch at which the open window ends
    pub reset_at: i64,
}

impl Decision {
    pub(crate) fn admitted(quota: Quota, entry: &Entry) -> Self {
        Self {
            ok: true,
            remaining: quota.max.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        }
    }

    pub(crate) fn denied(reset_at: i64) -> Self {
        Self {
            ok: false,
            remaining: 0,
            reset_at,
        }
    }

    /// Whole seconds until the window ends, rounded up.
    ///
    /// Never less than one for a denial, so it can go straight into a
    /// `Retry-After` header.
    pub fn retry_after_secs(&self, now_ms: i64) -> u64 {
        let millis = self.reset_at.saturating_sub(now_ms).max(0) as u64;
        let secs = millis.div_ceil(1000);
        if self.ok {
            secs
        } else {
            secs.max(1)
        }
    }
}
