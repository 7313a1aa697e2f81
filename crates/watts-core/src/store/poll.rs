// ── Adaptive polling cadence ──
//
// After a write the vendor cloud takes a few seconds to report the new
// device state. A successful write opens a fast-poll window; once it
// expires the normal interval applies again.

use std::time::Duration;

use tokio::time::Instant;

/// Interval used while a fast-poll window is open.
pub const FAST_POLL_INTERVAL: Duration = Duration::from_secs(15);
/// How long a fast-poll window stays open after a write.
pub const FAST_POLL_DURATION: Duration = Duration::from_secs(300);

/// Normal and fast polling intervals plus the current window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollWindow {
    normal: Duration,
    fast: Duration,
    fast_until: Option<Instant>,
}

impl PollWindow {
    pub fn new(normal: Duration) -> Self {
        Self {
            normal,
            fast: normal.min(FAST_POLL_INTERVAL),
            fast_until: None,
        }
    }

    pub fn normal(&self) -> Duration {
        self.normal
    }

    pub fn fast(&self) -> Duration {
        self.fast
    }

    /// Open (or extend) the fast window from `now`. A no-op when the
    /// normal interval is already at least as fast.
    pub fn arm(&mut self, now: Instant) {
        if self.fast < self.normal {
            self.fast_until = Some(now + FAST_POLL_DURATION);
        }
    }

    pub fn is_fast(&self, now: Instant) -> bool {
        self.fast_until.is_some_and(|until| now < until)
    }

    /// Interval to wait before the next refresh.
    pub fn interval(&self, now: Instant) -> Duration {
        if self.is_fast(now) {
            self.fast
        } else {
            self.normal
        }
    }
}
