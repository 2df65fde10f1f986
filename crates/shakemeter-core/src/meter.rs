//! The shake meter: single owner of all mutable state.
//!
//! Samples, drive ticks and resets arrive as [`Input`]s and are applied
//! strictly in arrival order. The meter has no internal thread or timer;
//! the caller (see [`crate::runtime`]) stamps inputs with monotonic
//! milliseconds and calls [`ShakeMeter::handle`].
//!
//! ## Usage
//!
//! ```ignore
//! let mut meter = ShakeMeter::new(MeterConfig::default(), NoopEffect)?;
//! meter.on_sample(Sample::new(1.8, 0.4, 0.9), 120);
//! for event in meter.on_tick(150) {
//!     // render snapshots, fire one-shot pulses
//! }
//! ```

use chrono::Utc;

use crate::config::{Config, MeterConfig};
use crate::counter::{Counter, Transition};
use crate::effect::EffectDevice;
use crate::error::ConfigError;
use crate::events::{EffectOperation, Event, Snapshot};
use crate::feedback::{FeedbackChange, FeedbackState, FeedbackTrigger};
use crate::filter::ShakeFilter;
use crate::rate::RateTracker;
use crate::sensor::Sample;

/// Inputs accepted by the meter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input {
    SampleReceived { sample: Sample, at_ms: u64 },
    DriveTick { at_ms: u64 },
    ResetRequested,
}

pub struct ShakeMeter<E: EffectDevice> {
    config: MeterConfig,
    filter: ShakeFilter,
    rate: RateTracker,
    counter: Counter,
    feedback: FeedbackTrigger<E>,
}

impl<E: EffectDevice> ShakeMeter<E> {
    /// Build a meter with feedback enabled.
    ///
    /// # Errors
    ///
    /// Fails fast with `ConfigError::InvalidValue` if the config is unusable.
    pub fn new(config: MeterConfig, effect: E) -> Result<Self, ConfigError> {
        Self::build(config, FeedbackTrigger::new(effect))
    }

    /// Build from the full application config, honouring `feedback.enabled`.
    pub fn from_config(config: &Config, effect: E) -> Result<Self, ConfigError> {
        let feedback = if config.feedback.enabled {
            FeedbackTrigger::new(effect)
        } else {
            FeedbackTrigger::disabled(effect)
        };
        Self::build(config.meter.clone(), feedback)
    }

    fn build(config: MeterConfig, feedback: FeedbackTrigger<E>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            filter: ShakeFilter::new(config.shake_magnitude_threshold),
            rate: RateTracker::new(config.rate_window_ms),
            counter: Counter::new(&config),
            feedback,
            config,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    pub fn count(&self) -> u32 {
        self.counter.count()
    }

    pub fn is_hot(&self) -> bool {
        self.counter.is_hot()
    }

    pub fn energy(&self) -> f64 {
        self.counter.energy()
    }

    pub fn feedback_state(&self) -> FeedbackState {
        self.feedback.state()
    }

    pub fn effect(&self) -> &E {
        self.feedback.device()
    }

    /// Shake timestamps currently held (not yet evicted).
    pub fn rate_window_len(&self) -> usize {
        self.rate.len()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            count: self.counter.count(),
            max_count: self.counter.max_count(),
            is_hot: self.counter.is_hot(),
            energy: self.counter.energy(),
            progress_ratio: self.counter.progress_ratio(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn handle(&mut self, input: Input) -> Vec<Event> {
        match input {
            Input::SampleReceived { sample, at_ms } => {
                self.on_sample(sample, at_ms);
                Vec::new()
            }
            Input::DriveTick { at_ms } => self.on_tick(at_ms),
            Input::ResetRequested => self.reset(),
        }
    }

    /// Filter one sample. Returns true if it registered as a shake.
    pub fn on_sample(&mut self, sample: Sample, at_ms: u64) -> bool {
        if self.filter.is_shake(&sample) {
            self.rate.observe(at_ms);
            true
        } else {
            false
        }
    }

    /// One drive tick: update the count, reconcile the effect, report changes.
    pub fn on_tick(&mut self, at_ms: u64) -> Vec<Event> {
        let rate = self.rate.current_rate(at_ms);
        let step = self.counter.tick(rate);

        let mut events = Vec::new();
        for transition in &step.transitions {
            tracing::debug!(?transition, count = step.count, rate, "counter transition");
            events.push(transition_event(*transition, step.count));
        }
        if let Some(change) = self.feedback.sync(self.counter.is_hot()) {
            events.push(feedback_event(change));
        }
        if step.changed() {
            events.push(Event::StateSnapshot(self.snapshot()));
        }
        events
    }

    /// Back to zero: count, rate window and effect. Idempotent.
    pub fn reset(&mut self) -> Vec<Event> {
        let previous = self.counter.count();
        let transitions = self.counter.reset();
        self.rate.clear();
        tracing::debug!(previous, "counter reset");

        let mut events = vec![Event::CounterReset {
            previous,
            at: Utc::now(),
        }];
        events.extend(transitions.into_iter().map(|t| transition_event(t, 0)));
        if let Some(change) = self.feedback.reset() {
            events.push(feedback_event(change));
        }
        events.push(Event::StateSnapshot(self.snapshot()));
        events
    }

    /// Teardown: force-stop the effect. The count is left as is.
    pub fn shutdown(&mut self) -> Vec<Event> {
        self.feedback
            .reset()
            .map(feedback_event)
            .into_iter()
            .collect()
    }
}

fn transition_event(transition: Transition, count: u32) -> Event {
    let at = Utc::now();
    match transition {
        Transition::EnteredHot => Event::EnteredHot { count, at },
        Transition::ExitedHot => Event::ExitedHot { count, at },
        Transition::ReachedMax => Event::ReachedMax { count, at },
    }
}

fn feedback_event(change: FeedbackChange) -> Event {
    let at = Utc::now();
    match change {
        FeedbackChange::Started => Event::EffectStarted { at },
        FeedbackChange::Stopped => Event::EffectStopped { at },
        FeedbackChange::StartFailed(e) => Event::EffectFailed {
            operation: EffectOperation::Start,
            message: e.to_string(),
            at,
        },
        FeedbackChange::StopFailed(e) => Event::EffectFailed {
            operation: EffectOperation::Stop,
            message: e.to_string(),
            at,
        },
    }
}
