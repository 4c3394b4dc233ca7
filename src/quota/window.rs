//! Sliding window of token usage records.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Tokens consumed by one completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageRecord {
    pub tokens: usize,
    pub recorded_at: Instant,
}

/// Time-ordered usage records with a cached running total.
///
/// Records are only ever appended with a non-decreasing timestamp, so expiry is
/// always a prefix of the deque. `total` equals the sum of the retained
/// records' tokens, saturating at `usize::MAX`.
#[derive(Debug)]
pub struct SlidingWindow {
    width: Duration,
    records: VecDeque<UsageRecord>,
    total: usize,
}

impl SlidingWindow {
    pub fn new(width: Duration) -> Self {
        Self { width, records: VecDeque::new(), total: 0 }
    }

    pub fn width(&self) -> Duration {
        self.width
    }

    pub fn record(&mut self, tokens: usize, now: Instant) {
        // A stale `now` is clamped to the newest record so expiry stays a prefix.
        let recorded_at = match self.records.back() {
            Some(last) if last.recorded_at > now => last.recorded_at,
            _ => now,
        };
        self.records.push_back(UsageRecord { tokens, recorded_at });
        self.total = self.total.saturating_add(tokens);
        self.evict(now);
    }

    /// Tokens consumed within the window ending at `now`.
    pub fn current(&mut self, now: Instant) -> usize {
        self.evict(now);
        self.total
    }

    /// Whole seconds until the oldest retained record expires, rounded up.
    pub fn wait_secs(&mut self, now: Instant) -> u64 {
        self.evict(now);
        let Some(oldest) = self.records.front() else {
            return 0;
        };
        let age = now.saturating_duration_since(oldest.recorded_at);
        let remaining = self.width.saturating_sub(age);
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn evict(&mut self, now: Instant) {
        // A saturated total no longer tracks the records; rebuild it instead.
        let saturated = self.total == usize::MAX;
        while let Some(oldest) = self.records.front() {
            if now.saturating_duration_since(oldest.recorded_at) <= self.width {
                break;
            }
            if !saturated {
                self.total -= oldest.tokens;
            }
            self.records.pop_front();
        }
        if saturated {
            self.total = self.records.iter().fold(0usize, |sum, r| sum.saturating_add(r.tokens));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: Duration = Duration::from_secs(60);

    #[test]
    fn test_empty_window() {
        let mut window = SlidingWindow::new(WIDTH);
        let now = Instant::now();
        assert_eq!(window.current(now), 0);
        assert_eq!(window.wait_secs(now), 0);
        assert!(window.is_empty());
    }

    #[test]
    fn test_total_tracks_live_records() {
        let mut window = SlidingWindow::new(WIDTH);
        let t0 = Instant::now();
        let usages = [(100, 0u64), (250, 10), (40, 30), (600, 59)];
        for (tokens, at) in usages {
            window.record(tokens, t0 + Duration::from_secs(at));
        }

        for probe in [0u64, 30, 60, 61, 70, 89, 90, 91, 118, 119, 120, 200] {
            let now = t0 + Duration::from_secs(probe);
            let expected: usize = usages
                .iter()
                .filter(|(_, at)| now.saturating_duration_since(t0 + Duration::from_secs(*at)) <= WIDTH)
                .map(|(tokens, _)| tokens)
                .sum();
            assert_eq!(window.current(now), expected, "at t+{probe}s");
        }
    }

    #[test]
    fn test_record_exactly_at_width_is_retained() {
        let mut window = SlidingWindow::new(WIDTH);
        let t0 = Instant::now();
        window.record(5, t0);
        assert_eq!(window.current(t0 + WIDTH), 5);
        assert_eq!(window.current(t0 + WIDTH + Duration::from_millis(1)), 0);
    }

    #[test]
    fn test_wait_counts_down_from_oldest_record() {
        let mut window = SlidingWindow::new(WIDTH);
        let t0 = Instant::now();
        window.record(10, t0);
        window.record(10, t0 + Duration::from_secs(20));

        assert_eq!(window.wait_secs(t0), 60);
        assert_eq!(window.wait_secs(t0 + Duration::from_millis(500)), 60);
        assert_eq!(window.wait_secs(t0 + Duration::from_secs(55)), 5);
        // Oldest expired: the next record now drives the wait.
        assert_eq!(window.wait_secs(t0 + Duration::from_secs(61)), 19);
    }

    #[test]
    fn test_everything_expires() {
        let mut window = SlidingWindow::new(WIDTH);
        let t0 = Instant::now();
        window.record(9000, t0);
        window.record(400, t0 + Duration::from_secs(5));
        let later = t0 + Duration::from_secs(300);
        assert_eq!(window.current(later), 0);
        assert_eq!(window.wait_secs(later), 0);
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn test_stale_timestamp_keeps_order() {
        let mut window = SlidingWindow::new(WIDTH);
        let t0 = Instant::now();
        window.record(1, t0 + Duration::from_secs(10));
        window.record(2, t0);
        assert_eq!(window.current(t0 + Duration::from_secs(10)), 3);
        assert_eq!(window.current(t0 + Duration::from_secs(71)), 0);
    }

    #[test]
    fn test_huge_reported_usage_saturates() {
        let mut window = SlidingWindow::new(WIDTH);
        let t0 = Instant::now();
        window.record(usize::MAX, t0);
        window.record(1, t0 + Duration::from_secs(1));
        assert_eq!(window.current(t0 + Duration::from_secs(1)), usize::MAX);
        assert_eq!(window.current(t0 + Duration::from_secs(61)), 1);
        assert_eq!(window.current(t0 + Duration::from_secs(62)), 0);
    }
}
