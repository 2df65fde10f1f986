//! Accelerometer input.
//!
//! The core never talks to a sensor driver. It consumes samples pushed by a
//! [`SampleSource`] over a channel and stamps them on arrival. Recorded
//! traces are JSON lines, one [`TimedSample`] per line:
//!
//! ```text
//! {"at_ms":0,"x":0.02,"y":-0.01,"z":1.0}
//! {"at_ms":100,"x":1.4,"y":0.9,"z":0.7}
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{CoreError, SensorError};

/// One 3-axis acceleration reading, in g.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the acceleration vector.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// A sample with its monotonic timestamp, as stored in recorded traces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedSample {
    pub at_ms: u64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl TimedSample {
    pub fn new(at_ms: u64, sample: Sample) -> Self {
        Self {
            at_ms,
            x: sample.x,
            y: sample.y,
            z: sample.z,
        }
    }

    pub fn sample(&self) -> Sample {
        Sample::new(self.x, self.y, self.z)
    }
}

/// A producer of accelerometer samples.
///
/// `subscribe` must not block: implementations start delivering samples in
/// the background and return. `unsubscribe` stops delivery and is safe to
/// call when not subscribed.
pub trait SampleSource: Send {
    fn subscribe(&mut self, interval_ms: u64, tx: mpsc::Sender<Sample>) -> Result<(), SensorError>;

    fn unsubscribe(&mut self) -> Result<(), SensorError>;
}

/// Plays back a recorded trace at its recorded timing.
///
/// The subscribe interval is ignored; recorded timestamps decide when each
/// sample is delivered. Requires a running tokio runtime.
pub struct ReplaySource {
    samples: Vec<TimedSample>,
    task: Option<JoinHandle<()>>,
}

impl ReplaySource {
    pub fn new(samples: Vec<TimedSample>) -> Self {
        Self {
            samples,
            task: None,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.task.is_some()
    }
}

impl SampleSource for ReplaySource {
    fn subscribe(&mut self, _interval_ms: u64, tx: mpsc::Sender<Sample>) -> Result<(), SensorError> {
        if self.task.is_some() {
            return Ok(());
        }
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| SensorError::Unavailable(format!("no async runtime: {e}")))?;

        let samples = self.samples.clone();
        self.task = Some(handle.spawn(async move {
            let start = tokio::time::Instant::now();
            for timed in samples {
                tokio::time::sleep_until(start + Duration::from_millis(timed.at_ms)).await;
                if tx.send(timed.sample()).await.is_err() {
                    // Receiver gone: the session shut down.
                    break;
                }
            }
        }));
        Ok(())
    }

    fn unsubscribe(&mut self) -> Result<(), SensorError> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        Ok(())
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// A sampler that can never be started, e.g. on hardware without an
/// accelerometer.
#[derive(Debug, Clone, Default)]
pub struct UnavailableSource {
    pub reason: String,
}

impl SampleSource for UnavailableSource {
    fn subscribe(&mut self, _interval_ms: u64, _tx: mpsc::Sender<Sample>) -> Result<(), SensorError> {
        let reason = if self.reason.is_empty() {
            "no accelerometer present".to_string()
        } else {
            self.reason.clone()
        };
        Err(SensorError::Unavailable(reason))
    }

    fn unsubscribe(&mut self) -> Result<(), SensorError> {
        Ok(())
    }
}

/// Parse a JSON-lines trace. Blank lines and `#` comments are skipped.
///
/// # Errors
///
/// Returns `SensorError::Trace` for malformed lines and for timestamps that
/// go backwards.
pub fn parse_trace(content: &str) -> Result<Vec<TimedSample>, SensorError> {
    let mut samples: Vec<TimedSample> = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let sample: TimedSample = serde_json::from_str(line).map_err(|e| SensorError::Trace {
            line: idx + 1,
            message: e.to_string(),
        })?;
        if let Some(prev) = samples.last() {
            if sample.at_ms < prev.at_ms {
                return Err(SensorError::Trace {
                    line: idx + 1,
                    message: format!("timestamp {} is before {}", sample.at_ms, prev.at_ms),
                });
            }
        }
        samples.push(sample);
    }
    Ok(samples)
}

/// Read a JSON-lines trace from disk.
pub fn read_trace(path: &Path) -> Result<Vec<TimedSample>, CoreError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_trace(&content)?)
}

/// Render samples as a JSON-lines trace.
pub fn to_json_lines(samples: &[TimedSample]) -> Result<String, CoreError> {
    let mut out = String::new();
    for sample in samples {
        out.push_str(&serde_json::to_string(sample)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_of_gravity_at_rest() {
        assert_eq!(Sample::new(0.0, 0.0, 1.0).magnitude(), 1.0);
        assert_eq!(Sample::new(3.0, 4.0, 0.0).magnitude(), 5.0);
    }

    #[test]
    fn parse_trace_skips_comments_and_blank_lines() {
        let trace = "# recorded on a table\n\n{\"at_ms\":0,\"x\":0.0,\"y\":0.0,\"z\":1.0}\n{\"at_ms\":100,\"x\":2.0,\"y\":0.0,\"z\":1.0}\n";
        let samples = parse_trace(trace).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].at_ms, 100);
        assert_eq!(samples[1].sample(), Sample::new(2.0, 0.0, 1.0));
    }

    #[test]
    fn parse_trace_reports_line_of_bad_json() {
        let trace = "{\"at_ms\":0,\"x\":0.0,\"y\":0.0,\"z\":1.0}\nnot json\n";
        match parse_trace(trace) {
            Err(SensorError::Trace { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected trace error, got {other:?}"),
        }
    }

    #[test]
    fn parse_trace_rejects_backwards_timestamps() {
        let trace = "{\"at_ms\":200,\"x\":0.0,\"y\":0.0,\"z\":1.0}\n{\"at_ms\":100,\"x\":0.0,\"y\":0.0,\"z\":1.0}\n";
        assert!(parse_trace(trace).is_err());
    }

    #[test]
    fn json_lines_output_parses_back() {
        let samples = vec![
            TimedSample::new(0, Sample::new(0.0, 0.0, 1.0)),
            TimedSample::new(50, Sample::new(1.5, -0.5, 0.25)),
        ];
        let text = to_json_lines(&samples).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert_eq!(parse_trace(&text).unwrap(), samples);
    }

    #[test]
    fn unavailable_source_fails_to_subscribe() {
        let (tx, _rx) = mpsc::channel(1);
        let mut source = UnavailableSource::default();
        let err = source.subscribe(100, tx).unwrap_err();
        assert!(matches!(err, SensorError::Unavailable(_)));
        assert!(source.unsubscribe().is_ok());
    }

    #[test]
    fn replay_source_needs_a_runtime() {
        let (tx, _rx) = mpsc::channel(1);
        let mut source = ReplaySource::new(Vec::new());
        assert!(source.subscribe(100, tx).is_err());
        assert!(!source.is_subscribed());
    }

    #[tokio::test(start_paused = true)]
    async fn replay_source_delivers_in_order() {
        let samples = vec![
            TimedSample::new(0, Sample::new(0.0, 0.0, 1.0)),
            TimedSample::new(100, Sample::new(2.0, 0.0, 0.0)),
        ];
        let (tx, mut rx) = mpsc::channel(8);
        let mut source = ReplaySource::new(samples);
        source.subscribe(100, tx).unwrap();

        assert_eq!(rx.recv().await, Some(Sample::new(0.0, 0.0, 1.0)));
        assert_eq!(rx.recv().await, Some(Sample::new(2.0, 0.0, 0.0)));
        // Playback finished and the sender was dropped.
        assert_eq!(rx.recv().await, None);
        source.unsubscribe().unwrap();
    }
}
