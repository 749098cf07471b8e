//! Time utilities.
//!
//! The scheduler treats time as a 32-bit counter of milliseconds
//! ([`Millis`]) provided by a host [`Clock`]. The counter is allowed to
//! wrap around; see [`Deadline`] for what that means for deadlines.
mod clock;
mod deadline;

pub use self::{
    clock::{Clock, Millis, WRAP_PERIOD_MS},
    deadline::Deadline,
};
pub use crate::error::TimeError;
