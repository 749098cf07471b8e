use crate::registry::Handle;
use core::fmt;

/// Identifies a task attached to a [`Scheduler`].
///
/// A `TaskId` is a copyable name for a task; it does not own the task. Once
/// the task is removed from its scheduler, its `TaskId` no longer refers to
/// anything, and is never confused with a task spawned later, even if that
/// task reuses the same storage.
///
/// [`Scheduler`]: crate::Scheduler
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TaskId(Handle);

impl TaskId {
    #[must_use]
    #[inline]
    pub(crate) const fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    #[must_use]
    #[inline]
    pub(crate) fn handle(self) -> Handle {
        self.0
    }
}

impl fmt::Debug for TaskId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

impl fmt::Display for TaskId {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
