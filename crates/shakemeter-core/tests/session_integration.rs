//! Integration tests: recorded traces through the meter and the async session.

use std::time::Duration;

use shakemeter_core::sensor::{read_trace, to_json_lines};
use shakemeter_core::{
    spawn_session, Config, Event, Input, NoopEffect, ReplaySource, Sample, ShakeMeter,
    TimedSample,
};

/// Shake at 10 Hz for `shake_ms`, then rest until `total_ms`.
fn burst_trace(shake_ms: u64, total_ms: u64) -> Vec<TimedSample> {
    (0..total_ms / 100)
        .map(|i| {
            let at = i * 100;
            let sample = if at < shake_ms {
                Sample::new(1.6, -0.8, 1.1)
            } else {
                Sample::new(0.01, 0.02, 0.99)
            };
            TimedSample::new(at, sample)
        })
        .collect()
}

/// Drive a meter from a trace in virtual time, ticking every `tick_ms`.
fn replay_virtual(meter: &mut ShakeMeter<NoopEffect>, trace: &[TimedSample], until_ms: u64) -> Vec<Event> {
    let tick_ms = meter.config().drive_tick_ms;
    let mut events = Vec::new();
    let mut samples = trace.iter().peekable();
    let mut now = 0;
    while now <= until_ms {
        while let Some(s) = samples.next_if(|s| s.at_ms <= now) {
            events.extend(meter.handle(Input::SampleReceived {
                sample: s.sample(),
                at_ms: s.at_ms,
            }));
        }
        events.extend(meter.handle(Input::DriveTick { at_ms: now }));
        now += tick_ms;
    }
    events
}

#[test]
fn trace_file_round_trip_drives_meter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("burst.jsonl");
    let trace = burst_trace(8000, 16_000);
    std::fs::write(&path, to_json_lines(&trace).unwrap()).unwrap();

    let loaded = read_trace(&path).unwrap();
    assert_eq!(loaded.len(), trace.len());

    let mut meter = ShakeMeter::from_config(&Config::default(), NoopEffect).unwrap();
    let events = replay_virtual(&mut meter, &loaded, 16_000);

    let peak = events
        .iter()
        .filter_map(|e| e.snapshot().map(|s| s.count))
        .max()
        .unwrap();
    assert_eq!(peak, 100);
    assert_eq!(meter.count(), 0);

    let kinds: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            Event::EnteredHot { .. } => Some("entered"),
            Event::ReachedMax { .. } => Some("max"),
            Event::ExitedHot { .. } => Some("exited"),
            Event::EffectStarted { .. } => Some("start"),
            Event::EffectStopped { .. } => Some("stop"),
            _ => None,
        })
        .collect();
    assert_eq!(kinds, vec!["entered", "start", "max", "exited", "stop"]);
}

#[test]
fn energy_tracks_count() {
    let mut meter = ShakeMeter::from_config(&Config::default(), NoopEffect).unwrap();
    let events = replay_virtual(&mut meter, &burst_trace(2000, 2000), 2000);
    let last = events.iter().rev().find_map(|e| e.snapshot()).unwrap();
    assert_eq!(last.energy, last.count as f64 * 0.5);
    assert_eq!(last.max_count, 100);
}

#[test]
fn missing_trace_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_trace(&dir.path().join("nope.jsonl")).is_err());
}

#[tokio::test(start_paused = true)]
async fn session_matches_virtual_replay_peak() {
    let config = Config::default();
    let meter = ShakeMeter::from_config(&config, NoopEffect).unwrap();
    let mut handle = spawn_session(
        meter,
        ReplaySource::new(burst_trace(3000, 3000)),
        config.sensor.sample_interval_ms,
    );

    tokio::time::sleep(Duration::from_millis(3000)).await;
    let mid = handle.shutdown().await.unwrap();

    let mut virtual_meter = ShakeMeter::from_config(&config, NoopEffect).unwrap();
    replay_virtual(&mut virtual_meter, &burst_trace(3000, 3000), 3000);

    // Tick phase relative to sample arrival may differ by one tick.
    let diff = (mid.final_snapshot.count as i64 - virtual_meter.count() as i64).abs();
    assert!(diff <= 2, "session {} vs virtual {}", mid.final_snapshot.count, virtual_meter.count());
}
