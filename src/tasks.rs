//! Tasks run by the demo.
use crate::cli::Options;
use morel::{
    task::{Channel, Timeout},
    Context, Endpoint, Millis, Outcome, Scheduler, Work,
};

/// The endpoint the ping and pong tasks hit the ball back and forth on.
const BALL: Endpoint = Endpoint::new(0xba11);
const PING: Channel = 0;
const PONG: Channel = 1;

/// How long `Ping` waits before serving again when nobody is listening.
const RESERVE_DELAY: Millis = 10;

pub(crate) fn spawn_all(scheduler: &mut Scheduler, opts: &Options) {
    for &nice in &opts.heartbeats {
        scheduler
            .build_task()
            .name("heartbeat")
            .nice(nice)
            .spawn(Heartbeat {
                remaining: opts.beats,
                stop: opts.stop,
            });
    }

    scheduler.build_task().name("pong").spawn(Pong {
        rounds: opts.rounds,
        patience: opts.patience,
        returned: 0,
    });
    scheduler
        .build_task()
        .name("ping")
        .nice(RESERVE_DELAY)
        .spawn(Ping {
            rounds: opts.rounds,
            patience: opts.patience,
            served: 0,
            awaiting: false,
        });
}

/// Logs a message every time it runs, a fixed number of times.
#[derive(Debug)]
struct Heartbeat {
    remaining: u32,
    stop: bool,
}

impl Work for Heartbeat {
    fn work(&mut self, cx: &mut Context<'_>) -> Outcome {
        self.remaining = self.remaining.saturating_sub(1);
        tracing::info!(
            task.id = %cx.id(),
            nice = cx.nice(),
            now = cx.now(),
            remaining = self.remaining,
            "thump"
        );

        if self.remaining == 0 {
            if self.stop {
                cx.stop();
            } else {
                cx.exit();
            }
        }
        Outcome::Success
    }
}

/// Serves numbered balls to `Pong` and waits for each one to come back.
#[derive(Debug)]
struct Ping {
    rounds: u32,
    patience: Millis,
    served: u32,
    awaiting: bool,
}

impl Work for Ping {
    fn work(&mut self, cx: &mut Context<'_>) -> Outcome {
        let mut outcome = Outcome::Success;
        if self.awaiting {
            self.awaiting = false;
            if cx.was_notified() {
                tracing::info!(ball = cx.value(), now = cx.now(), "ping got the ball back");
            } else {
                tracing::warn!(ball = self.served, "pong never returned the ball");
                outcome = Outcome::Failure;
            }
        }

        if self.served == self.rounds {
            tracing::info!(rounds = self.rounds, "ping is done");
            cx.exit();
            return outcome;
        }

        let ball = self.served + 1;
        if cx.notify(BALL, 0, ball as usize, PING) == 0 {
            // pong hasn't started waiting yet; serve again after our nice delay.
            tracing::debug!(ball, "nobody to serve to");
            return Outcome::Void;
        }

        tracing::info!(ball, "ping");
        self.served = ball;
        self.awaiting = true;
        cx.wait(BALL, Timeout::After(self.patience), PONG);
        outcome
    }
}

/// Returns every ball served by `Ping`.
#[derive(Debug)]
struct Pong {
    rounds: u32,
    patience: Millis,
    returned: u32,
}

impl Work for Pong {
    fn work(&mut self, cx: &mut Context<'_>) -> Outcome {
        if cx.was_notified() {
            let ball = cx.value();
            tracing::info!(ball, "pong");
            cx.notify(BALL, 0, ball, PONG);
            self.returned += 1;
            if self.returned == self.rounds {
                tracing::info!(rounds = self.rounds, "pong is done");
                cx.exit();
                return Outcome::Success;
            }
        } else if cx.control().endpoint().is_some() {
            if !cx.siblings().any(|(_, task)| task.name() == Some("ping")) {
                tracing::warn!(returned = self.returned, "ping left without finishing");
                cx.exit();
                return Outcome::Failure;
            }
            tracing::debug!("still waiting for a serve");
        }

        cx.wait(BALL, Timeout::After(self.patience.saturating_mul(2)), PING);
        Outcome::Success
    }
}
