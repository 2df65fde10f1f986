//! Looping victory effect (sound and/or haptics).
//!
//! The core only decides when the effect runs. Devices must return from
//! `start`/`stop` immediately; anything slow belongs behind a
//! [`ChannelEffect`] worker.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::EffectError;

pub trait EffectDevice: Send {
    fn start(&mut self) -> Result<(), EffectError>;

    fn stop(&mut self) -> Result<(), EffectError>;
}

impl<E: EffectDevice + ?Sized> EffectDevice for Box<E> {
    fn start(&mut self) -> Result<(), EffectError> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<(), EffectError> {
        (**self).stop()
    }
}

/// Device for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEffect;

impl EffectDevice for NoopEffect {
    fn start(&mut self) -> Result<(), EffectError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EffectError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectCommand {
    Start,
    Stop,
}

/// Fire-and-forget adapter posting commands to a playback worker.
///
/// A full queue reports `Busy`; a dropped worker reports `Released`.
#[derive(Debug, Clone)]
pub struct ChannelEffect {
    tx: mpsc::Sender<EffectCommand>,
}

impl ChannelEffect {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<EffectCommand>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    fn post(&self, command: EffectCommand) -> Result<(), EffectError> {
        self.tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => EffectError::Busy,
            TrySendError::Closed(_) => EffectError::Released,
        })
    }
}

impl EffectDevice for ChannelEffect {
    fn start(&mut self) -> Result<(), EffectError> {
        self.post(EffectCommand::Start)
    }

    fn stop(&mut self) -> Result<(), EffectError> {
        self.post(EffectCommand::Stop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_effect_posts_commands() {
        let (mut effect, mut rx) = ChannelEffect::new(4);
        effect.start().unwrap();
        effect.stop().unwrap();
        assert_eq!(rx.try_recv().unwrap(), EffectCommand::Start);
        assert_eq!(rx.try_recv().unwrap(), EffectCommand::Stop);
    }

    #[test]
    fn full_queue_is_busy() {
        let (mut effect, _rx) = ChannelEffect::new(1);
        effect.start().unwrap();
        assert_eq!(effect.stop(), Err(EffectError::Busy));
    }

    #[test]
    fn dropped_worker_is_released() {
        let (mut effect, rx) = ChannelEffect::new(1);
        drop(rx);
        assert_eq!(effect.start(), Err(EffectError::Released));
    }

    #[test]
    fn boxed_device_delegates() {
        let mut effect: Box<dyn EffectDevice> = Box::new(NoopEffect);
        assert!(effect.start().is_ok());
        assert!(effect.stop().is_ok());
    }
}
