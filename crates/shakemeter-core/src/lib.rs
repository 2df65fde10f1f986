//! # Shakemeter Core Library
//!
//! This library turns a noisy 3-axis accelerometer stream into a bounded,
//! decaying "shake" count with threshold-driven feedback. It is consumed by
//! a UI shell (the `shakemeter-cli` binary being the reference one) that
//! renders snapshots and forwards reset requests.
//!
//! ## Architecture
//!
//! ```text
//! SampleSource -> ShakeFilter -> RateTracker -> Counter -> { FeedbackTrigger, Event sink }
//! ```
//!
//! - **Shake Filter**: magnitude threshold on each sample
//! - **Rate Tracker**: shake timestamps in a trailing window
//! - **Counter**: leaky integrator driven by a fixed-cadence tick
//! - **Feedback Trigger**: single-flight looping effect while hot
//!
//! ## Key Components
//!
//! - [`ShakeMeter`]: single owner of all mutable state; call `handle()`
//! - [`spawn_session`]: tokio task owning a meter, a sensor and a ticker
//! - [`Config`]: TOML configuration management

pub mod config;
pub mod counter;
pub mod effect;
pub mod error;
pub mod events;
pub mod feedback;
pub mod filter;
pub mod meter;
pub mod rate;
pub mod runtime;
pub mod sensor;

pub use config::{Config, FeedbackConfig, MeterConfig, SensorConfig};
pub use counter::{Counter, CounterStep, Transition};
pub use effect::{ChannelEffect, EffectCommand, EffectDevice, NoopEffect};
pub use error::{ConfigError, CoreError, EffectError, SensorError};
pub use events::{EffectOperation, Event, Snapshot};
pub use feedback::{FeedbackChange, FeedbackState, FeedbackTrigger};
pub use filter::ShakeFilter;
pub use meter::{Input, ShakeMeter};
pub use rate::RateTracker;
pub use runtime::{spawn_session, SessionHandle, ShutdownReport};
pub use sensor::{ReplaySource, Sample, SampleSource, TimedSample, UnavailableSource};
