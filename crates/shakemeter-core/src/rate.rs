//! Sliding-window shake frequency.
//!
//! Timestamps are monotonic milliseconds. The window is trimmed on every
//! query, so an idle stretch reads as zero shakes even when nothing new is
//! observed.

use std::collections::VecDeque;

/// Trailing window of shake timestamps, oldest first.
#[derive(Debug, Clone)]
pub struct RateTracker {
    window_ms: u64,
    events: VecDeque<u64>,
}

impl RateTracker {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            events: VecDeque::new(),
        }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Record a shake at `at_ms`.
    ///
    /// A timestamp older than the newest entry is clamped to it so the
    /// window stays chronological and eviction remains a prefix trim.
    pub fn observe(&mut self, at_ms: u64) {
        let at_ms = match self.events.back() {
            Some(&newest) if at_ms < newest => newest,
            _ => at_ms,
        };
        self.events.push_back(at_ms);
    }

    /// Shakes within the window ending at `now_ms`.
    pub fn current_rate(&mut self, now_ms: u64) -> u32 {
        while let Some(&oldest) = self.events.front() {
            if now_ms.saturating_sub(oldest) > self.window_ms {
                self.events.pop_front();
            } else {
                break;
            }
        }
        self.events.len() as u32
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_events_inside_window() {
        let mut tracker = RateTracker::new(1000);
        for t in [0, 100, 200, 300] {
            tracker.observe(t);
        }
        assert_eq!(tracker.current_rate(300), 4);
        assert_eq!(tracker.current_rate(1000), 4);
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let mut tracker = RateTracker::new(1000);
        tracker.observe(0);
        assert_eq!(tracker.current_rate(1000), 1);
        assert_eq!(tracker.current_rate(1001), 0);
    }

    #[test]
    fn rate_decays_without_new_events() {
        let mut tracker = RateTracker::new(1000);
        for t in [0, 100, 200, 300] {
            tracker.observe(t);
        }
        assert_eq!(tracker.current_rate(1150), 2);
        assert_eq!(tracker.current_rate(1301), 0);
        assert!(tracker.is_empty());
    }

    #[test]
    fn out_of_order_timestamp_is_clamped() {
        let mut tracker = RateTracker::new(1000);
        tracker.observe(500);
        tracker.observe(400);
        assert_eq!(tracker.len(), 2);
        // Both entries now sit at 500 and leave the window together.
        assert_eq!(tracker.current_rate(1500), 2);
        assert_eq!(tracker.current_rate(1501), 0);
    }

    #[test]
    fn clear_empties_window() {
        let mut tracker = RateTracker::new(1000);
        tracker.observe(10);
        tracker.observe(20);
        tracker.clear();
        assert_eq!(tracker.current_rate(20), 0);
    }
}
