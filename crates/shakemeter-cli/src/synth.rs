//! Synthetic accelerometer traces for `simulate`.
//!
//! A pattern is a comma-separated list of `kind:duration_ms` phases, e.g.
//! `shake:4000,rest:3000,shake:1500`. Shaking produces random vectors well
//! above 1 g with occasional dropouts; resting produces gravity plus noise.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use shakemeter_core::{Sample, TimedSample};

const DROPOUT_PROBABILITY: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    Shake,
    Rest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub kind: PhaseKind,
    pub duration_ms: u64,
}

pub fn parse_pattern(pattern: &str) -> Result<Vec<Phase>, String> {
    let mut phases = Vec::new();
    for part in pattern.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (kind, duration) = part
            .split_once(':')
            .ok_or_else(|| format!("phase '{part}' must look like kind:duration_ms"))?;
        let kind = match kind {
            "shake" => PhaseKind::Shake,
            "rest" => PhaseKind::Rest,
            other => return Err(format!("unknown phase kind '{other}' (use shake or rest)")),
        };
        let duration_ms = duration
            .parse::<u64>()
            .map_err(|e| format!("invalid duration in '{part}': {e}"))?;
        phases.push(Phase { kind, duration_ms });
    }
    if phases.is_empty() {
        return Err("pattern is empty".to_string());
    }
    Ok(phases)
}

/// Generate one sample every `interval_ms` across all phases.
pub fn generate(phases: &[Phase], interval_ms: u64, seed: u64) -> Vec<TimedSample> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let interval_ms = interval_ms.max(1);
    let mut samples = Vec::new();
    let mut phase_start = 0;
    for phase in phases {
        let mut at = phase_start;
        while at < phase_start + phase.duration_ms {
            let sample = match phase.kind {
                PhaseKind::Shake if !rng.gen_bool(DROPOUT_PROBABILITY) => shake_sample(&mut rng),
                _ => rest_sample(&mut rng),
            };
            samples.push(TimedSample::new(at, sample));
            at += interval_ms;
        }
        phase_start += phase.duration_ms;
    }
    samples
}

fn shake_sample(rng: &mut Pcg64) -> Sample {
    let magnitude = rng.gen_range(1.8..3.2);
    let (x, y, z): (f64, f64, f64) = (
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    );
    let norm = (x * x + y * y + z * z).sqrt().max(1e-6);
    Sample::new(x / norm * magnitude, y / norm * magnitude, z / norm * magnitude)
}

fn rest_sample(rng: &mut Pcg64) -> Sample {
    Sample::new(
        rng.gen_range(-0.05..0.05),
        rng.gen_range(-0.05..0.05),
        1.0 + rng.gen_range(-0.05..0.05),
    )
}
