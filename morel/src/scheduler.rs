//! The scheduler: selects and dispatches tasks.
//!
//! See the [`Scheduler`] type for details.
use crate::{
    error::Error,
    registry::{Handle, Registry},
    task::{self, Channel, ControlBlock, Endpoint, Outcome, TaskId, TaskState, Work},
    time::{Clock, Millis},
};
use alloc::boxed::Box;
use core::fmt;

mod context;
pub use self::context::Context;


/// A single-threaded, cooperative task scheduler.
///
/// A `Scheduler` owns a set of tasks and a [`Clock`]. Each [tick], it
/// selects one task and dispatches it, calling its [`Work::work`] method
/// exactly once; [`Scheduler::run`] ticks until no tasks remain.
///
/// # Selection
///
/// Tasks are examined in round-robin order, starting after the task at the
/// scheduler's cursor and wrapping around, so that every task is examined
/// once per decision:
///
/// 1. A [`Starting`] task (one that has never run) is selected immediately.
/// 2. Among [`Running`] and [`Waiting`] tasks, the one with the earliest
///    [deadline] is selected: the least time remaining, or, for tasks that
///    are already overdue, the most overdue. Ties go to the task at the
///    cursor (the one after the most recently dispatched task), and then to
///    whichever was examined first. Infinite deadlines rank after every
///    finite deadline.
/// 3. [`Stopped`] tasks are never selected.
///
/// If the selected task's deadline has not yet arrived, the scheduler
/// [sleeps](Clock::sleep) until it does. This is a real blocking call: no
/// task makes progress while the scheduler is idle.
///
/// # Dispatch
///
/// The selected task is marked [`Running`], its work is performed once, and
/// then, if it is still running, its deadline is reset to its nice value
/// from now. The cursor moves to the task after it.
///
/// [tick]: Scheduler::tick
/// [`Starting`]: TaskState::Starting
/// [`Running`]: TaskState::Running
/// [`Waiting`]: TaskState::Waiting
/// [`Stopped`]: TaskState::Stopped
/// [deadline]: crate::Deadline
pub struct Scheduler {
    tasks: Registry<Entry>,
    clock: Clock,
}

/// Information about a single scheduler [tick](Scheduler::tick).
#[derive(Debug)]
#[non_exhaustive]
pub struct Tick {
    /// The task that was dispatched on this tick.
    pub task: TaskId,

    /// The [`Outcome`] of the task's unit of work.
    pub outcome: Outcome,

    /// How long the scheduler slept before dispatching the task, in
    /// milliseconds.
    pub slept: Millis,

    /// `true` if the task exited during this tick, and was removed from the
    /// scheduler.
    pub exited: bool,
}

/// Why [`Scheduler::run`] returned.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Exit {
    /// Every task has been removed.
    Empty,

    /// Tasks remain, but all of them are [stopped](TaskState::Stopped), so
    /// none can ever be dispatched again.
    Stalled {
        /// The number of stopped tasks remaining.
        stopped: usize,
    },
}

/// A task as stored by the scheduler.
pub(crate) struct Entry {
    pub(crate) control: ControlBlock,
    /// Taken out while the task's work is running, so that the work can
    /// borrow its siblings through a [`Context`].
    pub(crate) work: Option<Box<dyn Work>>,
}

/// The outcome of a scheduling decision.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Selection {
    pub(crate) handle: Handle,
    pub(crate) slept: Millis,
}

// === impl Scheduler ===

impl Scheduler {
    /// Returns a new scheduler with no tasks, driven by `clock`.
    #[must_use]
    pub const fn new(clock: Clock) -> Self {
        Self {
            tasks: Registry::new(),
            clock,
        }
    }

    /// Returns a new scheduler driven by `clock`, with space for at least
    /// `capacity` tasks before reallocating.
    #[must_use]
    pub fn with_capacity(clock: Clock, capacity: usize) -> Self {
        Self {
            tasks: Registry::with_capacity(capacity),
            clock,
        }
    }

    /// Returns the [`Clock`] driving this scheduler.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Spawns a task with the default settings, returning its [`TaskId`].
    ///
    /// This is equivalent to `scheduler.build_task().spawn(work)`.
    #[track_caller]
    pub fn spawn<W>(&mut self, work: W) -> TaskId
    where
        W: Work + 'static,
    {
        self.build_task().spawn(work)
    }

    /// Returns a new [task `Builder`] for configuring tasks prior to spawning
    /// them on this scheduler.
    ///
    /// [task `Builder`]: task::Builder
    #[must_use]
    pub fn build_task(&mut self) -> task::Builder<'_> {
        task::Builder::new(&mut self.tasks, &self.clock)
    }

    /// Removes a task from this scheduler, dropping its work.
    ///
    /// # Returns
    ///
    /// - [`Ok`]`(())` if the task was removed.
    /// - [`Err`]`(`[`Error::Registry`]`)` if `id` does not name a task
    ///   attached to this scheduler.
    pub fn remove(&mut self, id: TaskId) -> Result<(), Error> {
        let entry = self.tasks.detach(id.handle())?;
        tracing::debug!(task.id = %id, task.name = entry.control.name(), "removed task");
        Ok(())
    }

    /// Returns the number of tasks attached to this scheduler.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns `true` if no tasks are attached to this scheduler.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns `true` if `id` names a task attached to this scheduler.
    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains(id.handle())
    }

    /// Returns the [`ControlBlock`] of the task named by `id`, if it is
    /// attached to this scheduler.
    #[must_use]
    pub fn control(&self, id: TaskId) -> Option<&ControlBlock> {
        self.tasks.get(id.handle()).map(|entry| &entry.control)
    }

    /// Returns the [`TaskState`] of the task named by `id`, if it is attached
    /// to this scheduler.
    #[must_use]
    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.control(id).map(ControlBlock::state)
    }

    /// Returns an iterator over every attached task, in the order they were
    /// spawned.
    ///
    /// This is *not* the order in which they will be dispatched.
    pub fn tasks(&self) -> impl Iterator<Item = (TaskId, &ControlBlock)> + '_ {
        tasks(&self.tasks)
    }

    /// Wakes every task waiting for a notification matching `endpoint`,
    /// `attribute` and `channel`, delivering `value` to each of them.
    ///
    /// This is the same as [`Context::notify`], for use from outside of any
    /// task. Returns the number of tasks woken.
    pub fn notify(
        &mut self,
        endpoint: Endpoint,
        attribute: usize,
        value: usize,
        channel: Channel,
    ) -> usize {
        notify(&mut self.tasks, &self.clock, endpoint, attribute, value, channel)
    }

    /// Selects one task and dispatches it.
    ///
    /// If no task is ready yet, this sleeps until the earliest deadline.
    ///
    /// # Returns
    ///
    /// - [`Some`]`(`[`Tick`]`)` describing the dispatched task.
    /// - [`None`] if there are no tasks, or every task is stopped.
    pub fn tick(&mut self) -> Option<Tick> {
        let Selection { handle, slept } = self.select()?;
        let id = TaskId::from_handle(handle);

        let entry = self.tasks.get_mut(handle)?;
        let name = entry.control.name();
        let span = tracing::debug_span!("dispatch", task.id = %id, task.name = name);
        let _enter = span.enter();

        entry.control.begin_dispatch();
        let Some(mut work) = entry.work.take() else {
            unreachable!("task {id} was selected while its work was already running")
        };

        let (outcome, exited) = {
            let mut cx = Context::new(&mut self.tasks, &self.clock, id);
            let outcome = work.work(&mut cx);
            (outcome, cx.exit_requested())
        };
        tracing::trace!(?outcome, exited, "work done");

        // the successor is found *after* the work runs, since the work may
        // have spawned new tasks at the tail.
        let next = self.tasks.next(handle).or_else(|| self.tasks.first());

        if exited {
            drop(work);
            if let Err(error) = self.tasks.detach(handle) {
                unreachable!("dispatched task {id} could not be detached: {error}");
            }
            tracing::debug!(task.id = %id, task.name = name, "task exited");
        } else if let Some(entry) = self.tasks.get_mut(handle) {
            entry.work = Some(work);
            entry.control.finish_dispatch(&self.clock, outcome);
            tracing::trace!(
                state = %entry.control.state(),
                deadline = ?entry.control.deadline(),
                "task yielded"
            );
        }

        if let Some(next) = next.filter(|&next| next != handle) {
            // `next` was found after the work ran, and only the dispatched task
            // has been detached since.
            self.move_cursor(next);
        }

        Some(Tick {
            task: id,
            outcome,
            slept,
            exited,
        })
    }

    /// Dispatches tasks until none are left.
    ///
    /// There is no way to stop a running scheduler from outside: `run`
    /// returns once every task has [exited](Context::exit) or been
    /// [removed](Scheduler::remove), or once every remaining task has
    /// [stopped](Context::stop) and nothing could ever be dispatched again.
    pub fn run(&mut self) -> Exit {
        tracing::debug!(tasks = self.tasks.len(), clock = self.clock.name(), "scheduler starting");
        let mut ticks: u64 = 0;
        while self.tick().is_some() {
            ticks += 1;
        }

        let exit = if self.tasks.is_empty() {
            Exit::Empty
        } else {
            Exit::Stalled {
                stopped: self.tasks.len(),
            }
        };
        tracing::debug!(ticks, ?exit, "scheduler finished");
        exit
    }

    /// Selects the next task to dispatch, moving the cursor to it and
    /// sleeping until its deadline if necessary.
    pub(crate) fn select(&mut self) -> Option<Selection> {
        let mut cursor = self.tasks.cursor()?;
        let now = self.clock.now();
        // (handle, slack); a `None` slack is an infinite deadline, and a
        // negative one is overdue. The task at the cursor is the first
        // candidate, so it wins ties.
        let mut candidate: Option<(Handle, Option<i32>)> =
            self.tasks.get(cursor).and_then(|entry| match entry.control.state() {
                TaskState::Running | TaskState::Waiting => {
                    Some((cursor, entry.control.deadline().slack_at(now)))
                }
                TaskState::Starting | TaskState::Stopped => None,
            });

        for _ in 0..self.tasks.len() {
            cursor = self.tasks.next(cursor).or_else(|| self.tasks.first())?;
            let control = &self.tasks.get(cursor)?.control;
            match control.state() {
                TaskState::Starting => {
                    tracing::trace!(task.id = %TaskId::from_handle(cursor), "selected starting task");
                    self.move_cursor(cursor);
                    return Some(Selection {
                        handle: cursor,
                        slept: 0,
                    });
                }
                TaskState::Running | TaskState::Waiting => {
                    let slack = control.deadline().slack_at(now);
                    let better = match candidate {
                        None => true,
                        Some((_, best)) => sooner(slack, best),
                    };
                    if better {
                        candidate = Some((cursor, slack));
                    }
                }
                TaskState::Stopped => {}
            }
        }

        let (handle, _) = candidate?;
        self.move_cursor(handle);

        let remaining = self.tasks.get(handle)?.control.deadline().remaining(&self.clock);
        if remaining > 0 {
            tracing::debug!(task.id = %TaskId::from_handle(handle), ms = remaining, "idle");
            self.clock.sleep(remaining);
        }

        Some(Selection {
            handle,
            slept: remaining,
        })
    }

    /// Moves the cursor to `handle`, which must be attached.
    #[track_caller]
    fn move_cursor(&mut self, handle: Handle) {
        if let Err(error) = self.tasks.set_cursor(handle) {
            unreachable!("cursor moved to a task that is not attached: {error}");
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("clock", &self.clock)
            .field("tasks", &self.tasks)
            .finish()
    }
}

// === impl Entry ===

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.control, f)
    }
}

/// Returns `true` if a task with slack `a` is due sooner than one with slack
/// `b`. The more overdue of two late tasks is sooner. Infinite deadlines
/// (`None`) are never sooner than anything.
#[inline]
fn sooner(a: Option<i32>, b: Option<i32>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a < b,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

pub(crate) fn tasks(tasks: &Registry<Entry>) -> impl Iterator<Item = (TaskId, &ControlBlock)> + '_ {
    tasks
        .iter()
        .map(|(handle, entry)| (TaskId::from_handle(handle), &entry.control))
}

/// Wakes every waiting task matching `endpoint`, `attribute` and `channel`.
pub(crate) fn notify(
    tasks: &mut Registry<Entry>,
    clock: &Clock,
    endpoint: Endpoint,
    attribute: usize,
    value: usize,
    channel: Channel,
) -> usize {
    let now = clock.now();
    let mut woken = 0;
    let mut curr = tasks.first();
    while let Some(handle) = curr {
        if let Some(entry) = tasks.get_mut(handle) {
            if entry
                .control
                .try_wake(now, endpoint, attribute, value, channel)
            {
                woken += 1;
            }
        }
        curr = tasks.next(handle);
    }
    tracing::trace!(?endpoint, channel, attribute, value, woken, "notify");
    woken
}
