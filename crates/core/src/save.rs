//! Debounced save scheduling
//!
//! Edits arrive in bursts while the user drags and clicks; writing on every
//! edit would hammer the store. The scheduler keeps a single deadline that
//! is pushed back by every edit, and fires once the stream has been quiet
//! for the whole period. It holds no data itself, so the flush that follows
//! always reads the latest ledger state.

use std::time::{Duration, Instant};

/// Quiet period before an edit burst is flushed
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(2000);

/// Single-deadline debounce timer for annotation flushes
///
/// Pure bookkeeping over caller-supplied instants; it never sleeps or
/// spawns, which keeps it trivially testable and host-agnostic.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    quiet_period: Duration,
    deadline: Option<Instant>,
}

impl SaveScheduler {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            deadline: None,
        }
    }

    /// Push the deadline back to one full quiet period from `now`
    ///
    /// Re-arming an already armed scheduler replaces the pending deadline,
    /// so a steady edit stream keeps exactly one flush pending.
    pub fn note_edit(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet_period);
    }

    /// Drop the pending deadline, if any
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has passed
    ///
    /// Returns true at most once per armed deadline; the caller performs
    /// the flush and re-arms on the next edit.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for SaveScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}
