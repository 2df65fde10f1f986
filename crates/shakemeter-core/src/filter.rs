//! Magnitude threshold filter turning raw samples into shake events.

use crate::sensor::Sample;

/// Stateless shake detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeFilter {
    threshold: f64,
}

impl ShakeFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True iff the sample's magnitude is strictly above the threshold.
    pub fn is_shake(&self, sample: &Sample) -> bool {
        sample.magnitude() > self.threshold
    }
}
