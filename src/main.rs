use clap::Parser;
use color_eyre::{
    eyre::{format_err, WrapErr},
    Help,
};
use morel::{Clock, Exit, Scheduler};

mod cli;
mod tasks;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let opts = cli::Options::parse();
    opts.output
        .trace_init()
        .context("failed to initialize logging")
        .suggestion("check the `--log` filter syntax")?;

    tracing::info!("growing morels!");
    tracing::debug!(
        ?opts.heartbeats,
        opts.beats,
        opts.stop,
        opts.rounds,
        opts.patience,
        ?opts.ticks,
        "demo configuration"
    );

    let mut scheduler = Scheduler::with_capacity(Clock::std(), opts.heartbeats.len() + 2);
    tasks::spawn_all(&mut scheduler, &opts);
    for (id, control) in scheduler.tasks() {
        tracing::info!(
            task.id = %id,
            task.name = control.name(),
            task.nice = control.nice(),
            "ready"
        );
    }

    let exit = match opts.ticks {
        Some(max) => run_for(&mut scheduler, max),
        None => Some(scheduler.run()),
    };

    match exit {
        Some(Exit::Empty) => {
            tracing::info!("every task finished");
            Ok(())
        }
        Some(Exit::Stalled { stopped }) if opts.stop => {
            tracing::info!(stopped, "every task finished or stopped");
            Ok(())
        }
        Some(Exit::Stalled { stopped }) => Err(format_err!("{stopped} tasks stopped unexpectedly"))
            .note("tasks only stop themselves when `--stop` is passed"),
        None => {
            for (id, control) in scheduler.tasks() {
                tracing::info!(
                    task.id = %id,
                    task.name = control.name(),
                    task.state = %control.state(),
                    dispatches = control.dispatches(),
                    "still running"
                );
            }
            Ok(())
        }
    }
}

/// Ticks `scheduler` at most `max` times, returning how it exited if it ran
/// out of work first.
fn run_for(scheduler: &mut Scheduler, max: u64) -> Option<Exit> {
    for _ in 0..max {
        if scheduler.tick().is_none() {
            return Some(if scheduler.is_empty() {
                Exit::Empty
            } else {
                Exit::Stalled {
                    stopped: scheduler.len(),
                }
            });
        }
    }

    tracing::info!(ticks = max, "tick limit reached");
    None
}
