use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use shakemeter_core::sensor::to_json_lines;
use shakemeter_core::{
    spawn_session, ChannelEffect, Config, EffectCommand, EffectDevice, ReplaySource, ShakeMeter,
    TimedSample,
};

use super::RunSummary;
use crate::console::{ConsoleEffect, EventPrinter};
use crate::synth;

const EFFECT_QUEUE: usize = 4;

#[derive(Args)]
pub struct SimulateArgs {
    /// Seed for the synthetic accelerometer
    #[arg(long, default_value_t = 7)]
    pub seed: u64,
    /// Comma-separated phases, each `shake:<ms>` or `rest:<ms>`
    #[arg(long, default_value = "shake:6000,rest:6000")]
    pub pattern: String,
    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
    /// Run through the async session on the wall clock
    #[arg(long)]
    pub realtime: bool,
    /// Also write the generated trace to this file (JSON lines)
    #[arg(long)]
    pub record: Option<PathBuf>,
    /// Reset the counter at this many milliseconds into the run
    #[arg(long)]
    pub reset_at: Option<u64>,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let phases = synth::parse_pattern(&args.pattern)?;
    let trace = synth::generate(&phases, config.sensor.sample_interval_ms, args.seed);
    tracing::info!(samples = trace.len(), seed = args.seed, "generated trace");

    if let Some(path) = &args.record {
        std::fs::write(path, to_json_lines(&trace)?)?;
        tracing::info!(path = %path.display(), "trace recorded");
    }

    let printer = EventPrinter::new(args.json);
    let summary = if args.realtime {
        run_realtime(&config, trace, args.reset_at, &printer)?
    } else {
        let mut meter = ShakeMeter::from_config(&config, ConsoleEffect::new(&config.feedback))?;
        super::drive_virtual(&mut meter, &trace, args.reset_at, &printer)?
    };
    summary.print(config.meter.max_count, args.json);
    Ok(())
}

fn run_realtime(
    config: &Config,
    trace: Vec<TimedSample>,
    reset_at_ms: Option<u64>,
    printer: &EventPrinter,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let (effect, mut commands) = ChannelEffect::new(EFFECT_QUEUE);
        let mut console = ConsoleEffect::new(&config.feedback);
        let player = tokio::spawn(async move {
            while let Some(command) = commands.recv().await {
                let result = match command {
                    EffectCommand::Start => console.start(),
                    EffectCommand::Stop => console.stop(),
                };
                if let Err(e) = result {
                    tracing::warn!(?command, error = %e, "console effect rejected command");
                }
            }
        });

        let meter = ShakeMeter::from_config(config, effect)?;
        let run_for = Duration::from_millis(super::run_length_ms(meter.config(), &trace));

        let mut handle = spawn_session(meter, ReplaySource::new(trace), config.sensor.sample_interval_ms);
        let mut summary = RunSummary::default();

        let deadline = tokio::time::sleep(run_for);
        tokio::pin!(deadline);
        let reset = tokio::time::sleep(Duration::from_millis(reset_at_ms.unwrap_or(0)));
        tokio::pin!(reset);
        let mut reset_pending = reset_at_ms.is_some();

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                _ = &mut reset, if reset_pending => {
                    reset_pending = false;
                    handle.request_reset().await?;
                }
                event = handle.next_event() => match event {
                    Some(event) => {
                        printer.print(&event)?;
                        summary.record(std::slice::from_ref(&event));
                    }
                    None => break,
                },
            }
        }

        let report = handle.shutdown().await?;
        while let Some(event) = handle.try_next_event() {
            printer.print(&event)?;
            summary.record(std::slice::from_ref(&event));
        }
        for error in &report.release_errors {
            tracing::warn!(error = %error, "release failed during shutdown");
        }
        player.await?;
        Ok::<_, Box<dyn std::error::Error>>(summary)
    })
}
