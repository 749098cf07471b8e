use super::Entry;
use crate::{
    registry::Registry,
    task::{self, Channel, ControlBlock, Endpoint, TaskId, Timeout, Work},
    time::{Clock, Millis},
};
use core::fmt;

/// The view of the [`Scheduler`] given to a task while it performs a unit of
/// [`Work`].
///
/// A `Context` is how a running task changes its own scheduling (waiting,
/// adjusting its nice value, stopping, or exiting) and how it reaches its
/// siblings (notifying them, inspecting them, and spawning new tasks).
///
/// [`Scheduler`]: super::Scheduler
pub struct Context<'a> {
    tasks: &'a mut Registry<Entry>,
    clock: &'a Clock,
    id: TaskId,
    exit: bool,
}

impl<'a> Context<'a> {
    pub(super) fn new(tasks: &'a mut Registry<Entry>, clock: &'a Clock, id: TaskId) -> Self {
        Self {
            tasks,
            clock,
            id,
            exit: false,
        }
    }

    /// Returns the [`TaskId`] of the current task.
    #[must_use]
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the current time, according to the scheduler's [`Clock`].
    #[must_use]
    #[inline]
    pub fn now(&self) -> Millis {
        self.clock.now()
    }

    /// Returns the scheduler's [`Clock`].
    #[must_use]
    #[inline]
    pub fn clock(&self) -> &Clock {
        self.clock
    }

    /// Returns the current task's name, if it has one.
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        self.control().name()
    }

    /// Returns the current task's [`ControlBlock`].
    #[must_use]
    pub fn control(&self) -> &ControlBlock {
        match self.tasks.get(self.id.handle()) {
            Some(entry) => &entry.control,
            None => unreachable!("running task {} is not attached to its scheduler", self.id),
        }
    }

    fn control_mut(&mut self) -> &mut ControlBlock {
        match self.tasks.get_mut(self.id.handle()) {
            Some(entry) => &mut entry.control,
            None => unreachable!("running task {} is not attached to its scheduler", self.id),
        }
    }

    /// Begins waiting for any notification on `endpoint` and `channel`,
    /// giving up after `timeout`.
    ///
    /// The wait takes effect when the current unit of work returns: the task
    /// is not dispatched again until it is notified or the timeout elapses.
    /// See [`ControlBlock::begin_unconditional_wait`] for details.
    pub fn wait(&mut self, endpoint: Endpoint, timeout: impl Into<Timeout>, channel: Channel) {
        let clock = self.clock;
        self.control_mut()
            .begin_unconditional_wait(clock, endpoint, timeout, channel);
    }

    /// Begins waiting for a notification on `endpoint` and `channel` carrying
    /// `attribute`, giving up after `timeout`.
    ///
    /// See [`ControlBlock::begin_conditional_wait`] for details.
    pub fn wait_for(
        &mut self,
        endpoint: Endpoint,
        timeout: impl Into<Timeout>,
        attribute: usize,
        channel: Channel,
    ) {
        let clock = self.clock;
        self.control_mut()
            .begin_conditional_wait(clock, endpoint, timeout, attribute, channel);
    }

    /// Returns the attribute matched by the notification that last woke the
    /// current task.
    #[must_use]
    pub fn attribute(&self) -> usize {
        self.control().read_matched_attribute()
    }

    /// Returns the value delivered by the notification that last woke the
    /// current task.
    #[must_use]
    pub fn value(&self) -> usize {
        self.control().read_delivered_value()
    }

    /// Returns `true` if the current task was woken by a notification, and
    /// `false` if its last wait timed out (or it never waited).
    #[must_use]
    pub fn was_notified(&self) -> bool {
        self.control().was_notified()
    }

    /// Wakes every sibling waiting for a notification matching `endpoint`,
    /// `attribute` and `channel`, delivering `value` to each of them.
    ///
    /// A waiting task matches if it waits on the same endpoint and channel,
    /// and its wait attribute is either the [wildcard](task::WILDCARD) or
    /// equal to `attribute`. Woken tasks become [`Running`] and are due
    /// immediately. Returns the number of tasks woken.
    ///
    /// [`Running`]: task::TaskState::Running
    pub fn notify(
        &mut self,
        endpoint: Endpoint,
        attribute: usize,
        value: usize,
        channel: Channel,
    ) -> usize {
        super::notify(self.tasks, self.clock, endpoint, attribute, value, channel)
    }

    /// Returns the current task's nice value.
    #[must_use]
    pub fn nice(&self) -> Millis {
        self.control().nice()
    }

    /// Sets the current task's nice value, which takes effect when this unit
    /// of work returns.
    pub fn set_nice(&mut self, nice: Millis) {
        self.control_mut().set_nice(nice);
    }

    /// Permanently idles the current task.
    ///
    /// The task stays attached to the scheduler, but is never dispatched
    /// again. If every remaining task is stopped, [`Scheduler::run`]
    /// returns.
    ///
    /// [`Scheduler::run`]: super::Scheduler::run
    pub fn stop(&mut self) {
        self.control_mut().stop();
    }

    /// Removes the current task from the scheduler once this unit of work
    /// returns, dropping it.
    pub fn exit(&mut self) {
        tracing::trace!(task.id = %self.id, "exit requested");
        self.exit = true;
    }

    /// Spawns a sibling task with the default settings.
    ///
    /// The new task is [`Starting`](task::TaskState::Starting), so it is
    /// dispatched on the next tick.
    #[track_caller]
    pub fn spawn<W>(&mut self, work: W) -> TaskId
    where
        W: Work + 'static,
    {
        self.build_task().spawn(work)
    }

    /// Returns a [task `Builder`](task::Builder) for spawning a configured
    /// sibling task.
    #[must_use]
    pub fn build_task(&mut self) -> task::Builder<'_> {
        task::Builder::new(self.tasks, self.clock)
    }

    /// Returns the [`ControlBlock`] of the sibling task named by `id`, if it
    /// is attached to the scheduler.
    #[must_use]
    pub fn sibling(&self, id: TaskId) -> Option<&ControlBlock> {
        self.tasks.get(id.handle()).map(|entry| &entry.control)
    }

    /// Returns an iterator over every other task attached to the scheduler.
    pub fn siblings(&self) -> impl Iterator<Item = (TaskId, &ControlBlock)> + '_ {
        let me = self.id;
        super::tasks(self.tasks).filter(move |&(id, _)| id != me)
    }

    pub(super) fn exit_requested(&self) -> bool {
        self.exit
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("control", self.control())
            .field("exit", &self.exit)
            .finish_non_exhaustive()
    }
}
