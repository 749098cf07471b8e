use super::*;
use crate::util::test::{trace_init, MockClock};

const ENDPOINT: Endpoint = Endpoint::new(1);

fn running(clock: &Clock, nice: Millis) -> ControlBlock {
    let mut control = ControlBlock::new(Deadline::after(clock, 0), nice, Some("test"));
    control.begin_dispatch();
    control
}

#[test]
fn new_control_block_is_starting() {
    let _trace = trace_init();
    let clock = MockClock::start_at(10);
    let control = ControlBlock::new(Deadline::after(&clock, 5), 20, None);

    assert_eq!(control.state(), TaskState::Starting);
    assert_eq!(control.deadline(), Deadline::At(15));
    assert_eq!(control.nice(), 20);
    assert_eq!(control.name(), None);
    assert_eq!(control.dispatches(), 0);
    assert_eq!(control.last_outcome(), None);
    assert_eq!(control.endpoint(), None);
    assert!(!control.was_notified());
}

#[test]
fn dispatch_resets_deadline_by_nice() {
    let _trace = trace_init();
    let clock = MockClock::start();
    let mut control = running(&clock, 30);
    assert_eq!(control.dispatches(), 1);

    MockClock::advance(7);
    control.finish_dispatch(&clock, Outcome::Void);
    assert_eq!(control.deadline(), Deadline::At(37));
    assert_eq!(control.last_outcome(), Some(Outcome::Void));
}

#[test]
fn wait_keeps_its_timeout_through_dispatch() {
    let _trace = trace_init();
    let clock = MockClock::start();
    let mut control = running(&clock, 30);

    control.begin_unconditional_wait(&clock, ENDPOINT, Timeout::After(500), 2);
    control.finish_dispatch(&clock, Outcome::Success);

    assert_eq!(control.state(), TaskState::Waiting);
    assert_eq!(control.deadline(), Deadline::At(500));
    assert_eq!(control.endpoint(), Some(ENDPOINT));
    assert_eq!(control.channel(), 2);
    assert_eq!(control.read_matched_attribute(), WILDCARD);
}

#[test]
fn wait_clears_delivered_value() {
    let _trace = trace_init();
    let clock = MockClock::start();
    let mut control = running(&clock, 0);

    control.begin_unconditional_wait(&clock, ENDPOINT, Timeout::Never, 0);
    assert!(control.try_wake(clock.now(), ENDPOINT, 3, 33, 0));
    assert_eq!(control.read_delivered_value(), 33);

    control.begin_conditional_wait(&clock, ENDPOINT, Timeout::Never, 4, 0);
    assert_eq!(control.read_delivered_value(), 0);
    assert_eq!(control.read_matched_attribute(), 4);
    assert!(!control.was_notified());
    assert!(control.deadline().is_infinite());
}

#[test]
fn wake_requires_waiting() {
    let _trace = trace_init();
    let clock = MockClock::start();
    let mut control = running(&clock, 0);

    assert!(!control.try_wake(clock.now(), ENDPOINT, 0, 1, 0));
    assert_eq!(control.state(), TaskState::Running);
    assert!(!control.was_notified());

    control.begin_unconditional_wait(&clock, ENDPOINT, Timeout::After(10), 0);
    control.stop();
    assert!(
        !control.try_wake(clock.now(), ENDPOINT, 0, 1, 0),
        "stopped tasks are never woken"
    );
    assert_eq!(control.state(), TaskState::Stopped);
}

#[test]
fn wildcard_wait_matches_any_attribute() {
    let _trace = trace_init();
    let clock = MockClock::start_at(100);
    let mut control = running(&clock, 0);

    control.begin_unconditional_wait(&clock, ENDPOINT, Timeout::After(1_000), 9);
    MockClock::advance(50);
    assert!(control.try_wake(clock.now(), ENDPOINT, 1234, 5, 9));

    assert_eq!(control.state(), TaskState::Running);
    assert_eq!(control.read_matched_attribute(), 1234);
    assert_eq!(control.read_delivered_value(), 5);
    assert_eq!(control.deadline(), Deadline::At(150));
}

#[test]
fn endpoint_of_compares_addresses() {
    let a = [0u8; 4];
    let b = [0u8; 4];

    assert_eq!(Endpoint::of(&a), Endpoint::of(&a));
    assert_ne!(Endpoint::of(&a), Endpoint::of(&b));
    assert_eq!(Endpoint::new(7).as_u64(), 7);
    assert_eq!(format!("{:?}", Endpoint::new(0xfe)), "Endpoint(fe)");
}

#[test]
fn outcome_conversions() {
    assert_eq!(Outcome::from(()), Outcome::Void);
    assert_eq!(Outcome::from(Ok::<(), &str>(())), Outcome::Success);
    assert_eq!(Outcome::from(Err::<(), _>("nope")), Outcome::Failure);
}

#[test]
fn states() {
    assert!(TaskState::Starting.is_schedulable());
    assert!(TaskState::Running.is_schedulable());
    assert!(TaskState::Waiting.is_schedulable());
    assert!(!TaskState::Stopped.is_schedulable());
    assert_eq!(TaskState::Waiting.to_string(), "waiting");
}

#[test]
fn timeout_from_millis() {
    let clock = MockClock::start_at(5);
    assert_eq!(Timeout::from(20u32), Timeout::After(20));
    assert_eq!(Timeout::After(20).deadline(&clock), Deadline::At(25));
    assert_eq!(Timeout::Never.deadline(&clock), Deadline::Infinite);
}
