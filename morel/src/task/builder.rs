use super::{ControlBlock, TaskId, Work};
use crate::{
    registry::Registry,
    scheduler::Entry,
    time::{Clock, Deadline, Millis},
};
use alloc::boxed::Box;
use core::{fmt, panic::Location};

/// Builds a new task prior to spawning it.
///
/// A `Builder` is returned by [`Scheduler::build_task`] and
/// [`Context::build_task`].
///
/// [`Scheduler::build_task`]: crate::Scheduler::build_task
/// [`Context::build_task`]: crate::Context::build_task
pub struct Builder<'a> {
    tasks: &'a mut Registry<Entry>,
    clock: &'a Clock,
    settings: Settings,
}

/// Configures settings for new tasks.
#[derive(Debug, Clone, Copy)]
struct Settings {
    name: Option<&'static str>,
    nice: Millis,
    start: Start,
}

#[derive(Debug, Clone, Copy)]
enum Start {
    After(Millis),
    At(Deadline),
}

impl<'a> Builder<'a> {
    pub(crate) fn new(tasks: &'a mut Registry<Entry>, clock: &'a Clock) -> Self {
        Self {
            tasks,
            clock,
            settings: Settings {
                name: None,
                nice: 0,
                start: Start::After(0),
            },
        }
    }

    /// Adds a name to the tasks produced by this builder.
    ///
    /// This will set the `task.name` `tracing` field of spans generated for
    /// this task.
    ///
    /// By default, tasks are unnamed.
    pub fn name(self, name: &'static str) -> Self {
        Self {
            settings: Settings {
                name: Some(name),
                ..self.settings
            },
            ..self
        }
    }

    /// Sets the task's nice value: the delay, in milliseconds, applied to
    /// its deadline after each unit of work.
    ///
    /// A task with a larger nice value is dispatched less often when its
    /// siblings are busy. By default, tasks have a nice value of 0.
    pub fn nice(self, nice: Millis) -> Self {
        Self {
            settings: Settings {
                nice,
                ..self.settings
            },
            ..self
        }
    }

    /// Sets the task's initial deadline to `delay` milliseconds after it is
    /// spawned.
    ///
    /// A new task is dispatched before any running or waiting sibling
    /// regardless of its deadline; the initial deadline only matters for
    /// ranking it against siblings that are starting at the same time. By
    /// default, the initial deadline is the time the task is spawned.
    pub fn delay(self, delay: Millis) -> Self {
        Self {
            settings: Settings {
                start: Start::After(delay),
                ..self.settings
            },
            ..self
        }
    }

    /// Sets the task's initial deadline.
    ///
    /// See [`Builder::delay`] for details.
    pub fn deadline(self, deadline: Deadline) -> Self {
        Self {
            settings: Settings {
                start: Start::At(deadline),
                ..self.settings
            },
            ..self
        }
    }

    /// Spawns a new task with this builder's configured settings, returning
    /// its [`TaskId`].
    ///
    /// The task starts in the [`Starting`](super::TaskState::Starting) state.
    #[track_caller]
    pub fn spawn<W>(self, work: W) -> TaskId
    where
        W: Work + 'static,
    {
        let Settings { name, nice, start } = self.settings;
        let deadline = match start {
            Start::After(delay) => Deadline::after(self.clock, delay),
            Start::At(deadline) => deadline,
        };
        let entry = Entry {
            control: ControlBlock::new(deadline, nice, name),
            work: Some(Box::new(work)),
        };
        let id = TaskId::from_handle(self.tasks.attach(entry));
        tracing::debug!(
            task.id = %id,
            task.name = name,
            task.nice = nice,
            ?deadline,
            spawned.at = %Location::caller(),
            "spawned task"
        );
        id
    }
}

impl fmt::Debug for Builder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("settings", &self.settings)
            .field("clock", &self.clock.name())
            .finish_non_exhaustive()
    }
}
