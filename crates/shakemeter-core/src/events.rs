use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Read-only view of the counter handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub count: u32,
    pub max_count: u32,
    pub is_hot: bool,
    pub energy: f64,
    /// count / max_count, 0.0 .. 1.0
    pub progress_ratio: f64,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectOperation {
    Start,
    Stop,
}

/// Every state change in the meter produces an Event.
/// The UI shell renders snapshots; transition events drive one-shot effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    StateSnapshot(Snapshot),
    /// Count crossed up into the hot zone.
    EnteredHot {
        count: u32,
        at: DateTime<Utc>,
    },
    /// Count dropped below the hot threshold.
    ExitedHot {
        count: u32,
        at: DateTime<Utc>,
    },
    /// Count newly reached its maximum (one-shot pulse/haptic).
    ReachedMax {
        count: u32,
        at: DateTime<Utc>,
    },
    EffectStarted {
        at: DateTime<Utc>,
    },
    EffectStopped {
        at: DateTime<Utc>,
    },
    EffectFailed {
        operation: EffectOperation,
        message: String,
        at: DateTime<Utc>,
    },
    CounterReset {
        previous: u32,
        at: DateTime<Utc>,
    },
    /// The sampler could not be started; the session runs without samples.
    SensorUnavailable {
        reason: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Event::StateSnapshot(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}
