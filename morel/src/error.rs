//! Errors returned by `morel`.
use crate::{registry::Handle, time::Millis};

/// Errors returned by [`Scheduler`](crate::Scheduler) operations.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A registry membership operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors returned by [`Registry`](crate::registry::Registry) membership
/// operations.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// The registry has no members.
    #[error("cannot detach from an empty registry")]
    Empty,

    /// The handle does not name a current member of this registry. It was
    /// either never attached here, or it has already been detached.
    #[error("{0:?} is not attached to this registry")]
    NotAttached(Handle),
}

/// Errors returned when constructing a [`Deadline`](crate::Deadline).
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum TimeError {
    /// The requested delay is longer than the longest delay a deadline can
    /// represent on a wrapping 32-bit millisecond clock.
    #[error("delay of {requested} ms exceeds the maximum of {max} ms")]
    DelayTooLong {
        /// The requested delay.
        requested: Millis,
        /// The longest supported delay.
        max: Millis,
    },
}
