#![allow(dead_code)]
use morel::{Clock, Millis};
use std::cell::{Cell, RefCell};

pub fn trace_init() {
    use tracing_subscriber::filter::LevelFilter;
    let _ = tracing_subscriber::fmt()
        .with_max_level(LevelFilter::TRACE)
        .with_test_writer()
        .try_init();
}

std::thread_local! {
    static NOW: Cell<Millis> = const { Cell::new(0) };
    static SLEPT: RefCell<Vec<Millis>> = const { RefCell::new(Vec::new()) };
}

/// Returns a clock for the current test thread, starting at `start`.
///
/// Sleeping advances the clock immediately, and records the requested
/// duration.
pub fn clock_at(start: Millis) -> Clock {
    NOW.with(|now| now.set(start));
    SLEPT.with(|slept| slept.borrow_mut().clear());
    Clock::new(now, sleep).named("test")
}

pub fn now() -> Millis {
    NOW.with(Cell::get)
}

pub fn advance(ms: Millis) {
    NOW.with(|now| now.set(now.get().wrapping_add(ms)));
}

/// Returns every sleep requested since the clock was created.
pub fn sleeps() -> Vec<Millis> {
    SLEPT.with(|slept| slept.borrow().clone())
}

fn sleep(ms: Millis) {
    SLEPT.with(|slept| slept.borrow_mut().push(ms));
    advance(ms);
}
