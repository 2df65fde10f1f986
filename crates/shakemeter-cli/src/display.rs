//! Presentation adapter: pure functions of a counter snapshot.
//!
//! Nothing here holds state. The message bands are keyed on the progress
//! ratio so they stay meaningful for any `max_count`.

use shakemeter_core::Snapshot;

/// Duration of the one-shot pulse played when the count reaches its max.
pub const PULSE_MS: u64 = 400;
const PULSE_PEAK: f64 = 1.25;

const COLD: (u8, u8, u8) = (0x3b, 0x82, 0xf6);
const HOT: (u8, u8, u8) = (0xef, 0x44, 0x44);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Snowflake,
    Fire,
}

impl Icon {
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Snowflake => "❄",
            Icon::Fire => "🔥",
        }
    }
}

pub fn message(snapshot: &Snapshot) -> &'static str {
    let ratio = snapshot.progress_ratio;
    if snapshot.count >= snapshot.max_count {
        "Maximum heat!"
    } else if snapshot.is_hot {
        "On fire!"
    } else if ratio >= 0.6 {
        "Almost there..."
    } else if ratio >= 0.3 {
        "Keep shaking"
    } else {
        "Shake it!"
    }
}

/// Snowflake until the counter is full, then fire.
pub fn icon(snapshot: &Snapshot) -> Icon {
    if snapshot.count >= snapshot.max_count {
        Icon::Fire
    } else {
        Icon::Snowflake
    }
}

/// Linear blend from cold blue to hot red, as `#rrggbb`.
pub fn color(snapshot: &Snapshot) -> String {
    let t = snapshot.progress_ratio.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        mix(COLD.0, HOT.0),
        mix(COLD.1, HOT.1),
        mix(COLD.2, HOT.2)
    )
}

/// Scale factor `elapsed_ms` into the max-count pulse: 1.0 -> 1.25 -> 1.0.
pub fn pulse_scale(elapsed_ms: u64) -> f64 {
    if elapsed_ms >= PULSE_MS {
        return 1.0;
    }
    let phase = elapsed_ms as f64 / PULSE_MS as f64;
    1.0 + (PULSE_PEAK - 1.0) * (std::f64::consts::PI * phase).sin()
}

pub fn progress_bar(snapshot: &Snapshot, width: usize) -> String {
    let filled = ((snapshot.progress_ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!(
        "[{}{}] {:>3} / {} shakes",
        "#".repeat(filled),
        "-".repeat(width - filled),
        snapshot.count,
        snapshot.max_count
    )
}

/// One rendered line for the terminal.
pub fn frame(snapshot: &Snapshot) -> String {
    format!(
        "{}  energy {:>5.1}  {}  {} {}",
        progress_bar(snapshot, 20),
        snapshot.energy,
        color(snapshot),
        icon(snapshot).glyph(),
        message(snapshot)
    )
}
