pub mod config;
pub mod replay;
pub mod simulate;

use shakemeter_core::{EffectDevice, Event, Input, MeterConfig, ShakeMeter, TimedSample};

use crate::console::EventPrinter;

/// Totals for the trailing summary line.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub events: usize,
    pub peak: u32,
}

impl RunSummary {
    pub fn record(&mut self, events: &[Event]) {
        self.events += events.len();
        if let Some(peak) = events.iter().filter_map(|e| e.snapshot().map(|s| s.count)).max() {
            self.peak = self.peak.max(peak);
        }
    }

    pub fn print(&self, max_count: u32, json: bool) {
        if !json {
            println!("done: {} events, peak {} / {max_count}", self.events, self.peak);
        }
    }
}

/// How long to keep ticking: the last sample, one rate window for it to
/// expire, and enough ticks to drain a full counter.
pub fn run_length_ms(config: &MeterConfig, trace: &[TimedSample]) -> u64 {
    let last_sample = trace.last().map_or(0, |s| s.at_ms);
    let drain = u64::from(config.max_count).saturating_mul(config.drive_tick_ms);
    last_sample
        .saturating_add(config.rate_window_ms)
        .saturating_add(drain)
}

/// Drive a meter from a trace on a virtual clock, printing events as they
/// happen. Runs until the counter has had time to drain after the last
/// sample.
pub fn drive_virtual<E: EffectDevice>(
    meter: &mut ShakeMeter<E>,
    trace: &[TimedSample],
    reset_at_ms: Option<u64>,
    printer: &EventPrinter,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let config = meter.config().clone();
    let until_ms = run_length_ms(&config, trace);

    let mut summary = RunSummary::default();
    let mut pending_reset = reset_at_ms;
    let mut samples = trace.iter().peekable();
    let mut now = 0;
    while now <= until_ms {
        while let Some(s) = samples.next_if(|s| s.at_ms <= now) {
            meter.handle(Input::SampleReceived {
                sample: s.sample(),
                at_ms: s.at_ms,
            });
        }
        let mut events = meter.handle(Input::DriveTick { at_ms: now });
        if pending_reset.is_some_and(|at| at <= now) {
            pending_reset = None;
            events.extend(meter.handle(Input::ResetRequested));
        }
        printer.print_all(&events)?;
        summary.record(&events);
        match now.checked_add(config.drive_tick_ms) {
            Some(next) => now = next,
            None => break,
        }
    }
    let teardown = meter.shutdown();
    printer.print_all(&teardown)?;
    summary.record(&teardown);
    Ok(summary)
}
