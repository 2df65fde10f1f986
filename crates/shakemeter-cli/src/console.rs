//! Terminal stand-ins for the effect device and the presentation sink.

use shakemeter_core::{EffectDevice, EffectError, Event, FeedbackConfig};

use crate::display;

/// Announces the looping victory effect on stderr.
pub struct ConsoleEffect {
    sound: Option<String>,
    haptics: bool,
    playing: bool,
}

impl ConsoleEffect {
    pub fn new(config: &FeedbackConfig) -> Self {
        Self {
            sound: config.sound.clone(),
            haptics: config.haptics,
            playing: false,
        }
    }
}

impl EffectDevice for ConsoleEffect {
    fn start(&mut self) -> Result<(), EffectError> {
        if self.playing {
            return Err(EffectError::Busy);
        }
        self.playing = true;
        let sound = self.sound.as_deref().unwrap_or("default victory loop");
        let haptics = if self.haptics { " + haptics" } else { "" };
        eprintln!("♪ playing {sound}{haptics}");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EffectError> {
        if !self.playing {
            return Err(EffectError::Released);
        }
        self.playing = false;
        eprintln!("♪ stopped");
        Ok(())
    }
}

/// Writes events either as rendered frames or as JSON lines.
pub struct EventPrinter {
    json: bool,
}

impl EventPrinter {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn print(&self, event: &Event) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", serde_json::to_string(event)?);
            return Ok(());
        }
        match event {
            Event::StateSnapshot(snapshot) => println!("{}", display::frame(snapshot)),
            Event::EnteredHot { count, .. } => println!(">>> heating up at {count}"),
            Event::ExitedHot { count, .. } => println!("<<< cooling down at {count}"),
            Event::ReachedMax { .. } => {
                let keyframes: Vec<String> = (0..=4)
                    .map(|i| format!("{:.2}", display::pulse_scale(i * display::PULSE_MS / 4)))
                    .collect();
                println!("*** MAX! pulse {}", keyframes.join(" -> "));
            }
            Event::CounterReset { previous, .. } => println!("--- reset (was {previous})"),
            Event::EffectFailed { operation, message, .. } => {
                println!("!!! effect {operation:?} failed: {message}")
            }
            Event::SensorUnavailable { reason, .. } => println!("!!! no sensor: {reason}"),
            Event::EffectStarted { .. } | Event::EffectStopped { .. } => {}
        }
        Ok(())
    }

    pub fn print_all(&self, events: &[Event]) -> Result<(), serde_json::Error> {
        for event in events {
            self.print(event)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_effect_rejects_double_start() {
        let mut effect = ConsoleEffect::new(&FeedbackConfig::default());
        assert!(effect.start().is_ok());
        assert_eq!(effect.start(), Err(EffectError::Busy));
        assert!(effect.stop().is_ok());
        assert_eq!(effect.stop(), Err(EffectError::Released));
    }
}
