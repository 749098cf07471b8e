use color_eyre::eyre::Result;
use morel::Millis;

/// Runs a handful of cooperative tasks on a `morel` scheduler.
#[derive(Debug, clap::Parser)]
#[command(author, version, about)]
pub(crate) struct Options {
    /// Nice values of the heartbeat tasks, in milliseconds. One heartbeat
    /// task is spawned for each value.
    #[arg(
        long = "nice",
        value_delimiter = ',',
        default_values_t = [1000, 100, 1000, 2000]
    )]
    pub(crate) heartbeats: Vec<Millis>,

    /// How many times each heartbeat task runs before it finishes.
    #[arg(long, default_value_t = 3)]
    pub(crate) beats: u32,

    /// Stop finished heartbeat tasks rather than removing them, leaving the
    /// scheduler stalled once everything else is done.
    #[arg(long)]
    pub(crate) stop: bool,

    /// How many balls the ping and pong tasks hit back and forth.
    #[arg(long, default_value_t = 5)]
    pub(crate) rounds: u32,

    /// How long the ping and pong tasks wait for each other before giving
    /// up on a round, in milliseconds.
    #[arg(long, default_value_t = 500)]
    pub(crate) patience: Millis,

    /// Stop after dispatching this many tasks, even if some are still
    /// runnable.
    #[arg(long)]
    pub(crate) ticks: Option<u64>,

    #[command(flatten)]
    pub(crate) output: OutputOptions,
}

/// Options that configure the demo's output.
#[derive(Debug, clap::Args)]
#[command(next_help_heading = "OUTPUT OPTIONS")]
pub(crate) struct OutputOptions {
    /// Configures logging.
    #[arg(short, long, env = "RUST_LOG", default_value = "morel_demo=info,morel=info")]
    log: String,
}

// === impl OutputOptions ===

impl OutputOptions {
    pub(crate) fn trace_init(&self) -> Result<()> {
        use tracing_subscriber::prelude::*;
        let filter = self.log.parse::<tracing_subscriber::EnvFilter>()?;
        let fmt = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(fmt)
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()?;
        Ok(())
    }
}
