//! Bounded leaky-integrator counter.
//!
//! The counter is driven at a fixed cadence. Each tick it rises by one while
//! the shake rate is at or above the configured floor and falls by one
//! otherwise, clamped to `0..=max_count`.
//!
//! ## Thresholds
//!
//! ```text
//! 0 ........ hot_threshold ........ max_count
//!   cold        |   hot (effect loops)  |  ReachedMax pulse
//! ```
//!
//! `EnteredHot` / `ExitedHot` fire once per edge of `count >= hot_threshold`;
//! `ReachedMax` fires each time the count newly lands on `max_count`.

use serde::{Deserialize, Serialize};

use crate::config::MeterConfig;

/// Edge events produced by a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    EnteredHot,
    ExitedHot,
    ReachedMax,
}

/// Result of one drive tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterStep {
    pub previous: u32,
    pub count: u32,
    pub transitions: Vec<Transition>,
}

impl CounterStep {
    pub fn changed(&self) -> bool {
        self.previous != self.count
    }
}

#[derive(Debug, Clone)]
pub struct Counter {
    count: u32,
    max_count: u32,
    hot_threshold: u32,
    rate_threshold: u32,
    energy_per_unit: f64,
}

impl Counter {
    /// Build a counter at zero. The config is expected to be validated.
    pub fn new(config: &MeterConfig) -> Self {
        Self {
            count: 0,
            max_count: config.max_count,
            hot_threshold: config.hot_threshold,
            rate_threshold: config.rate_threshold,
            energy_per_unit: config.energy_per_unit,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn hot_threshold(&self) -> u32 {
        self.hot_threshold
    }

    pub fn is_hot(&self) -> bool {
        self.count >= self.hot_threshold
    }

    /// Secondary metric shown next to the count.
    pub fn energy(&self) -> f64 {
        self.count as f64 * self.energy_per_unit
    }

    /// 0.0 .. 1.0
    pub fn progress_ratio(&self) -> f64 {
        if self.max_count == 0 {
            return 0.0;
        }
        self.count as f64 / self.max_count as f64
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Advance one drive tick given the current shake rate.
    pub fn tick(&mut self, rate: u32) -> CounterStep {
        let previous = self.count;
        let was_hot = self.is_hot();

        self.count = if rate >= self.rate_threshold {
            self.count.saturating_add(1).min(self.max_count)
        } else {
            self.count.saturating_sub(1)
        };
        debug_assert!(self.count <= self.max_count, "count escaped its bounds");

        let mut transitions = Vec::new();
        let is_hot = self.is_hot();
        if !was_hot && is_hot {
            transitions.push(Transition::EnteredHot);
        } else if was_hot && !is_hot {
            transitions.push(Transition::ExitedHot);
        }
        if previous < self.max_count && self.count == self.max_count {
            transitions.push(Transition::ReachedMax);
        }

        CounterStep {
            previous,
            count: self.count,
            transitions,
        }
    }

    /// Back to zero. Returns the transitions this causes (at most `ExitedHot`).
    pub fn reset(&mut self) -> Vec<Transition> {
        let was_hot = self.is_hot();
        self.count = 0;
        if was_hot && !self.is_hot() {
            vec![Transition::ExitedHot]
        } else {
            Vec::new()
        }
    }
}
