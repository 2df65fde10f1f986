use std::path::PathBuf;

use clap::Args;
use shakemeter_core::sensor::read_trace;
use shakemeter_core::{Config, ShakeMeter};

use crate::console::{ConsoleEffect, EventPrinter};

#[derive(Args)]
pub struct ReplayArgs {
    /// Recorded trace, one JSON sample per line
    pub path: PathBuf,
    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
    /// Reset the counter at this many milliseconds into the trace
    #[arg(long)]
    pub reset_at: Option<u64>,
}

pub fn run(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let trace = read_trace(&args.path)?;
    tracing::info!(samples = trace.len(), path = %args.path.display(), "replaying trace");

    let mut meter = ShakeMeter::from_config(&config, ConsoleEffect::new(&config.feedback))?;
    let printer = EventPrinter::new(args.json);
    let summary = super::drive_virtual(&mut meter, &trace, args.reset_at, &printer)?;
    summary.print(config.meter.max_count, args.json);
    Ok(())
}
