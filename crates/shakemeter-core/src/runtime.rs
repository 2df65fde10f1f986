//! Async session: one tokio task owning a [`ShakeMeter`].
//!
//! The task multiplexes three sources and applies them in arrival order:
//!
//! - samples pushed by the [`SampleSource`]
//! - a drive tick every `drive_tick_ms`
//! - commands from the [`SessionHandle`] (reset, shutdown)
//!
//! Timestamps are milliseconds since the session started, read from the
//! tokio clock so tests can run on paused time.
//!
//! Shutdown unsubscribes the sensor, stops the ticker and force-stops the
//! effect. All three run even if an earlier one fails.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::effect::EffectDevice;
use crate::error::{CoreError, Result};
use crate::events::{Event, Snapshot};
use crate::meter::ShakeMeter;
use crate::sensor::SampleSource;

const SAMPLE_BUFFER: usize = 64;
const COMMAND_BUFFER: usize = 8;

enum Command {
    Reset,
    Shutdown(oneshot::Sender<ShutdownReport>),
}

/// Final state handed back when a session shuts down.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub final_snapshot: Snapshot,
    /// Failures from releasing the sensor or effect. Logged, never fatal.
    pub release_errors: Vec<String>,
}

/// Handle to a running session.
///
/// Events queue without bound until read. A caller that never drains them
/// with [`next_event`](Self::next_event) or
/// [`try_next_event`](Self::try_next_event) holds one entry per emitted
/// event, so long-running renderers should drain on every frame.
///
/// Dropping the handle also ends the session (without a report).
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    events: mpsc::UnboundedReceiver<Event>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Ask the session to reset the counter.
    pub async fn request_reset(&self) -> Result<()> {
        self.commands
            .send(Command::Reset)
            .await
            .map_err(|_| CoreError::SessionClosed)
    }

    /// Next event, or `None` once the session has ended and all events
    /// were drained.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<Event> {
        self.events.try_recv().ok()
    }

    /// Stop the session and wait for teardown to finish.
    ///
    /// Events emitted during teardown remain readable afterwards.
    pub async fn shutdown(&mut self) -> Result<ShutdownReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Shutdown(reply_tx))
            .await
            .map_err(|_| CoreError::SessionClosed)?;
        let report = reply_rx.await.map_err(|_| CoreError::SessionClosed)?;
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| CoreError::Custom(format!("session task failed: {e}")))?;
        }
        Ok(report)
    }
}

/// Spawn the owning task on the current tokio runtime.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn spawn_session<E, S>(meter: ShakeMeter<E>, source: S, sample_interval_ms: u64) -> SessionHandle
where
    E: EffectDevice + 'static,
    S: SampleSource + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_session(
        meter,
        source,
        sample_interval_ms,
        command_rx,
        event_tx,
    ));
    SessionHandle {
        commands: command_tx,
        events: event_rx,
        task: Some(task),
    }
}

async fn run_session<E, S>(
    mut meter: ShakeMeter<E>,
    mut source: S,
    sample_interval_ms: u64,
    mut commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedSender<Event>,
) where
    E: EffectDevice,
    S: SampleSource,
{
    let started = Instant::now();
    let elapsed_ms = || started.elapsed().as_millis() as u64;
    // A closed event channel only means nobody is rendering.
    let forward = |batch: Vec<Event>| {
        for event in batch {
            let _ = events.send(event);
        }
    };

    let (sample_tx, mut sample_rx) = mpsc::channel(SAMPLE_BUFFER);
    let mut sensor_live = match source.subscribe(sample_interval_ms, sample_tx) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "sensor unavailable; running without samples");
            forward(vec![Event::SensorUnavailable {
                reason: e.to_string(),
                at: chrono::Utc::now(),
            }]);
            false
        }
    };

    let mut ticker = tokio::time::interval(Duration::from_millis(meter.config().drive_tick_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(
        drive_tick_ms = meter.config().drive_tick_ms,
        sample_interval_ms,
        "session started"
    );

    let reply = loop {
        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(Command::Reset) => forward(meter.reset()),
                Some(Command::Shutdown(reply)) => break Some(reply),
                None => break None,
            },
            sample = sample_rx.recv(), if sensor_live => match sample {
                Some(sample) => {
                    meter.on_sample(sample, elapsed_ms());
                }
                None => {
                    tracing::debug!("sensor stream ended");
                    sensor_live = false;
                }
            },
            _ = ticker.tick() => forward(meter.on_tick(elapsed_ms())),
        }
    };

    let mut release_errors = Vec::new();
    if let Err(e) = source.unsubscribe() {
        tracing::warn!(error = %e, "failed to unsubscribe sensor");
        release_errors.push(e.to_string());
    }
    drop(sample_rx);
    drop(ticker);
    let stop_events = meter.shutdown();
    for event in &stop_events {
        if let Event::EffectFailed { message, .. } = event {
            release_errors.push(message.clone());
        }
    }
    forward(stop_events);

    let report = ShutdownReport {
        final_snapshot: meter.snapshot(),
        release_errors,
    };
    tracing::info!(count = report.final_snapshot.count, "session stopped");
    if let Some(reply) = reply {
        let _ = reply.send(report);
    }
}
