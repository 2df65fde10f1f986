//! Single-flight controller for the looping victory effect.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --(hot, start ok)--> Active --(not hot)--> Idle
//!   ^                          |
//!   +------- reset() ----------+
//! ```
//!
//! The hot flag is sampled every drive tick rather than only on edges, so a
//! missed edge or a failed start is recovered on the next tick. Device
//! failures are logged and never leave the trigger in an unknown state.

use serde::{Deserialize, Serialize};

use crate::effect::EffectDevice;
use crate::error::EffectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackState {
    Idle,
    Active,
}

/// What a `sync` or `reset` call did to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackChange {
    Started,
    /// Start failed; still `Idle`, retried on the next hot tick.
    StartFailed(EffectError),
    Stopped,
    /// Stop failed; resources are assumed released and the state is `Idle`.
    StopFailed(EffectError),
}

pub struct FeedbackTrigger<E: EffectDevice> {
    device: E,
    state: FeedbackState,
    enabled: bool,
}

impl<E: EffectDevice> FeedbackTrigger<E> {
    pub fn new(device: E) -> Self {
        Self {
            device,
            state: FeedbackState::Idle,
            enabled: true,
        }
    }

    /// A disabled trigger never touches the device.
    pub fn disabled(device: E) -> Self {
        Self {
            enabled: false,
            ..Self::new(device)
        }
    }

    pub fn state(&self) -> FeedbackState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == FeedbackState::Active
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn device(&self) -> &E {
        &self.device
    }

    /// Reconcile the effect with the current hot flag.
    pub fn sync(&mut self, is_hot: bool) -> Option<FeedbackChange> {
        match (self.state, is_hot) {
            (FeedbackState::Idle, true) if self.enabled => Some(self.start()),
            (FeedbackState::Active, false) => Some(self.stop()),
            _ => None,
        }
    }

    /// Force `Idle`, stopping the effect if it is running.
    pub fn reset(&mut self) -> Option<FeedbackChange> {
        match self.state {
            FeedbackState::Active => Some(self.stop()),
            FeedbackState::Idle => None,
        }
    }

    fn start(&mut self) -> FeedbackChange {
        match self.device.start() {
            Ok(()) => {
                self.state = FeedbackState::Active;
                tracing::info!("victory effect started");
                FeedbackChange::Started
            }
            Err(e) => {
                tracing::warn!(error = %e, "victory effect failed to start");
                FeedbackChange::StartFailed(e)
            }
        }
    }

    fn stop(&mut self) -> FeedbackChange {
        self.state = FeedbackState::Idle;
        match self.device.stop() {
            Ok(()) => {
                tracing::info!("victory effect stopped");
                FeedbackChange::Stopped
            }
            Err(e) => {
                tracing::warn!(error = %e, "victory effect failed to stop; treating as released");
                FeedbackChange::StopFailed(e)
            }
        }
    }
}
