//! Tasks: the units of work run by a [`Scheduler`].
//!
//! A task is made of two parts:
//!
//! - a [`Work`] implementation, the task's behavior, which performs one
//!   unit of work each time it is dispatched and then returns, and
//! - a [`ControlBlock`], the scheduler's bookkeeping for the task: its
//!   [`TaskState`], its [`Deadline`], its *nice* value, and the fields used to
//!   match it against [notifications](crate::Context::notify) while it
//!   waits.
//!
//! Tasks are created with [`Scheduler::spawn`] or [`Scheduler::build_task`]
//! and are identified by a [`TaskId`].
//!
//! # Task states
//!
//! ```text
//!   ┌──────────┐  first dispatch   ┌─────────┐   wait / wait_for   ┌─────────┐
//!   │ Starting │ ────────────────► │ Running │ ──────────────────► │ Waiting │
//!   └──────────┘                   └─────────┘ ◄────────────────── └─────────┘
//!                                       │        notify / timeout       │
//!                                       │ stop                     stop │
//!                                       ▼                               │
//!                                  ┌─────────┐                          │
//!                                  │ Stopped │ ◄────────────────────────┘
//!                                  └─────────┘
//! ```
//!
//! [`Scheduler`]: crate::Scheduler
//! [`Scheduler::spawn`]: crate::Scheduler::spawn
//! [`Scheduler::build_task`]: crate::Scheduler::build_task
use crate::{
    scheduler::Context,
    time::{Clock, Deadline, Millis},
};
use core::fmt;

mod builder;
mod id;
mod wait;

pub use self::{
    builder::Builder,
    id::TaskId,
    wait::{Channel, Endpoint, Timeout, WILDCARD},
};

#[cfg(test)]
mod tests;

/// A task's behavior: one cooperative unit of work.
///
/// Each time the [`Scheduler`] dispatches a task, it calls [`Work::work`]
/// exactly once. That call is the task's entire time slice: the scheduler
/// cannot preempt it, so it must return promptly, and anything it blocks on
/// blocks every other task as well. State that must survive between units of
/// work lives in the implementing type.
///
/// `Work` is implemented for any `FnMut(&mut Context<'_>) -> Outcome`
/// closure, so simple tasks need not define a type of their own.
///
/// [`Scheduler`]: crate::Scheduler
pub trait Work {
    /// Performs one unit of work.
    ///
    /// The [`Context`] gives access to this task's own control block (to
    /// wait, change its nice value, stop, or exit) and to its siblings (to
    /// notify them or spawn new tasks).
    fn work(&mut self, cx: &mut Context<'_>) -> Outcome;
}

/// The result of one unit of [`Work`].
///
/// Outcomes are informational: the scheduler records the most recent one on
/// the task's [`ControlBlock`] and includes it in diagnostics, but never
/// changes a task's state because of it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Outcome {
    /// The unit of work succeeded.
    Success,
    /// The unit of work failed.
    Failure,
    /// The unit of work has no meaningful result.
    Void,
}

/// The scheduling state of a task.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TaskState {
    /// The task has been spawned but never dispatched. Starting tasks are
    /// always dispatched before any other task.
    Starting,
    /// The task is runnable. It will be dispatched when its deadline is the
    /// earliest among its siblings.
    Running,
    /// The task has been permanently idled and is never dispatched again.
    Stopped,
    /// The task is waiting for a notification, or for its wait timeout to
    /// elapse.
    Waiting,
}

/// The scheduler's bookkeeping for a single task.
///
/// A `ControlBlock` holds everything the [`Scheduler`] needs to decide when to
/// dispatch a task, and everything a notifier needs to decide whether to wake
/// it:
///
/// - its [`TaskState`],
/// - its [`Deadline`], which ranks it against its siblings,
/// - its *nice* value: the delay applied to its deadline after each dispatch,
/// - the [`Endpoint`], [`Channel`] and attribute it is waiting on, and the
///   value delivered by the notification that woke it.
///
/// [`Scheduler`]: crate::Scheduler
#[derive(Clone)]
pub struct ControlBlock {
    state: TaskState,
    deadline: Deadline,
    nice: Millis,
    wait: wait::WaitFields,
    name: Option<&'static str>,
    last_outcome: Option<Outcome>,
    dispatches: u64,
}

// === impl Work ===

impl<F> Work for F
where
    F: FnMut(&mut Context<'_>) -> Outcome,
{
    #[inline]
    fn work(&mut self, cx: &mut Context<'_>) -> Outcome {
        (self)(cx)
    }
}

// === impl Outcome ===

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Self::Void
    }
}

impl<E> From<Result<(), E>> for Outcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(_) => Self::Failure,
        }
    }
}

// === impl TaskState ===

impl TaskState {
    /// Returns `true` if a task in this state may be dispatched.
    #[must_use]
    pub fn is_schedulable(self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Waiting => "waiting",
        })
    }
}

// === impl ControlBlock ===

impl ControlBlock {
    pub(crate) fn new(deadline: Deadline, nice: Millis, name: Option<&'static str>) -> Self {
        Self {
            state: TaskState::Starting,
            deadline,
            nice,
            wait: wait::WaitFields::new(),
            name,
            last_outcome: None,
            dispatches: 0,
        }
    }

    /// Returns this task's current state.
    #[must_use]
    #[inline]
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Returns this task's current deadline.
    #[must_use]
    #[inline]
    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Returns this task's nice value: the delay, in milliseconds, applied
    /// to its deadline each time it finishes a unit of work.
    #[must_use]
    #[inline]
    pub fn nice(&self) -> Millis {
        self.nice
    }

    /// Sets this task's nice value.
    ///
    /// The new value takes effect the next time the task finishes a unit of
    /// work.
    pub fn set_nice(&mut self, nice: Millis) {
        self.nice = nice;
    }

    /// Returns the name this task was spawned with, if any.
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// Returns the [`Outcome`] of this task's most recent unit of work, or
    /// [`None`] if it has never been dispatched.
    #[must_use]
    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    /// Returns the number of times this task has been dispatched.
    #[must_use]
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    /// Permanently idles this task.
    ///
    /// A stopped task stays attached to its scheduler, but is skipped by
    /// every subsequent scheduling decision.
    pub fn stop(&mut self) {
        tracing::trace!(task.name = self.name, from = %self.state, "stop");
        self.state = TaskState::Stopped;
    }

    /// Begins waiting for any notification on `endpoint` and `channel`.
    ///
    /// The task's state becomes [`TaskState::Waiting`], and its deadline is
    /// set to `timeout` from now. Its wait attribute is set to the
    /// [`WILDCARD`], so that any notification on the endpoint and channel
    /// wakes it, and any previously delivered value is cleared.
    ///
    /// If the timeout elapses before a matching notification, the task is
    /// dispatched anyway. Woken tasks should therefore always re-check the
    /// condition they were waiting for; [`ControlBlock::was_notified`]
    /// distinguishes a notification from a timeout.
    pub fn begin_unconditional_wait(
        &mut self,
        clock: &Clock,
        endpoint: Endpoint,
        timeout: impl Into<Timeout>,
        channel: Channel,
    ) {
        self.begin_conditional_wait(clock, endpoint, timeout, WILDCARD, channel)
    }

    /// Begins waiting for a notification on `endpoint` and `channel` whose
    /// attribute equals `attribute`.
    ///
    /// This is identical to [`ControlBlock::begin_unconditional_wait`],
    /// except that only notifications carrying the same `attribute` wake the
    /// task. Passing the [`WILDCARD`] attribute (`0`) matches any
    /// notification.
    pub fn begin_conditional_wait(
        &mut self,
        clock: &Clock,
        endpoint: Endpoint,
        timeout: impl Into<Timeout>,
        attribute: usize,
        channel: Channel,
    ) {
        let timeout = timeout.into();
        tracing::trace!(
            task.name = self.name,
            ?endpoint,
            channel,
            attribute,
            ?timeout,
            "begin wait"
        );
        self.state = TaskState::Waiting;
        self.deadline = timeout.deadline(clock);
        self.wait = wait::WaitFields::waiting(endpoint, channel, attribute);
    }

    /// Returns the attribute matched by the notification that woke this
    /// task.
    ///
    /// While the task waits, this is the attribute it is waiting for.
    #[must_use]
    pub fn read_matched_attribute(&self) -> usize {
        self.wait.attribute
    }

    /// Returns the value delivered by the notification that woke this task,
    /// or `0` if it has not been notified since it began waiting.
    #[must_use]
    pub fn read_delivered_value(&self) -> usize {
        self.wait.value
    }

    /// Returns `true` if this task was woken by a notification since it last
    /// began waiting, rather than by its wait timeout.
    #[must_use]
    pub fn was_notified(&self) -> bool {
        self.wait.notified
    }

    /// Returns the endpoint this task most recently waited on.
    #[must_use]
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.wait.endpoint
    }

    /// Returns the channel this task most recently waited on.
    #[must_use]
    pub fn channel(&self) -> Channel {
        self.wait.channel
    }

    /// Wakes this task if it is waiting for a notification matching
    /// `endpoint`, `attribute` and `channel`.
    ///
    /// On a match, the delivered value and matched attribute are recorded,
    /// the task becomes [`TaskState::Running`], and its deadline is moved to
    /// `now` so that it is dispatched promptly. Returns `true` if the task
    /// was woken.
    pub(crate) fn try_wake(
        &mut self,
        now: Millis,
        endpoint: Endpoint,
        attribute: usize,
        value: usize,
        channel: Channel,
    ) -> bool {
        if self.state != TaskState::Waiting || !self.wait.matches(endpoint, attribute, channel) {
            return false;
        }

        tracing::trace!(task.name = self.name, ?endpoint, channel, attribute, value, "woken");
        self.wait.deliver(attribute, value);
        self.state = TaskState::Running;
        self.deadline = Deadline::At(now);
        true
    }

    /// Marks this task as being dispatched.
    pub(crate) fn begin_dispatch(&mut self) {
        self.state = TaskState::Running;
        self.dispatches += 1;
    }

    /// Records the end of a unit of work.
    ///
    /// If the task is still running, its deadline is reset to `nice` from
    /// now. A task that began waiting during its unit of work keeps the
    /// deadline set by its wait timeout.
    pub(crate) fn finish_dispatch(&mut self, clock: &Clock, outcome: Outcome) {
        self.last_outcome = Some(outcome);
        if self.state == TaskState::Running {
            self.deadline.reset(clock, self.nice);
        }
    }

    #[cfg(test)]
    pub(crate) fn set_deadline(&mut self, deadline: Deadline) {
        self.deadline = deadline;
    }
}

impl fmt::Debug for ControlBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            state,
            deadline,
            nice,
            wait,
            name,
            last_outcome,
            dispatches,
        } = self;
        let mut s = f.debug_struct("ControlBlock");
        if let Some(name) = name {
            s.field("name", name);
        }
        s.field("state", state)
            .field("deadline", deadline)
            .field("nice", nice)
            .field("wait", wait)
            .field("last_outcome", last_outcome)
            .field("dispatches", dispatches)
            .finish()
    }
}
