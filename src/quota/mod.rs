//! Process-wide token quota tracking.
//!
//! One [`QuotaTracker`] is created per process and shared (as an `Arc`) by every
//! explain run, so concurrent runs draw from the same budget.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

pub mod window;

pub use window::{SlidingWindow, UsageRecord};

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request fits in the remaining budget.
    Immediate,
    /// The request would overrun the budget; the oldest usage frees up after
    /// `seconds`.
    Wait { seconds: u64 },
}

/// Thread-safe sliding-window token counter.
#[derive(Debug)]
pub struct QuotaTracker {
    window: Mutex<SlidingWindow>,
}

impl QuotaTracker {
    pub fn new(width: Duration) -> Self {
        Self { window: Mutex::new(SlidingWindow::new(width)) }
    }

    pub fn width(&self) -> Duration {
        self.lock().width()
    }

    /// Account for `tokens` consumed at `now`.
    pub fn record_usage(&self, tokens: usize, now: Instant) {
        let mut window = self.lock();
        window.record(tokens, now);
        tracing::trace!(tokens, total = window.current(now), "recorded token usage");
    }

    /// Seconds until the oldest retained usage expires; 0 for an empty window.
    pub fn remaining_wait_seconds(&self, now: Instant) -> u64 {
        self.lock().wait_secs(now)
    }

    /// Tokens consumed within the window ending at `now`.
    pub fn current_count(&self, now: Instant) -> usize {
        self.lock().current(now)
    }

    /// Decide whether `estimated` more tokens fit within `budget`.
    ///
    /// Count and wait are read under one lock so they describe the same state.
    pub fn check(&self, estimated: usize, budget: usize, now: Instant) -> Admission {
        let mut window = self.lock();
        let current = window.current(now);
        if current.saturating_add(estimated) <= budget {
            return Admission::Immediate;
        }
        Admission::Wait { seconds: window.wait_secs(now) }
    }

    // Every operation leaves the window consistent, so a panic in another
    // holder does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, SlidingWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
