use super::{Clock, Millis};
use crate::error::TimeError;

/// A point in time after which something is due, or no such point at all.
///
/// A `Deadline` is either [`Deadline::At`] an absolute [`Millis`] timestamp
/// on some [`Clock`], or [`Deadline::Infinite`]. Deadlines are plain values:
/// they may be copied and reset freely.
///
/// # Wraparound
///
/// [`Clock`] timestamps wrap every `2^32` milliseconds, so a deadline is
/// compared against the current time using wrapping subtraction: the
/// difference `deadline - now` is interpreted as a *signed* 32-bit value.
/// This stays correct across a wrap of the counter, but it means a deadline
/// can only be told apart from an expired one while it lies less than half
/// the wrap period (`2^31` ms, roughly 24.8 days) in the future. This is a
/// known limitation, and is why delays are capped at
/// [`Deadline::MAX_DELAY`].
///
/// # Infinite deadlines
///
/// An infinite deadline never [expires](Deadline::has_expired), but its
/// [remaining time](Deadline::remaining) is defined as **zero**, not as an
/// unbounded value. Code that ranks deadlines by urgency should use
/// [`Deadline::slack`] instead, which reports `None` for infinite deadlines
/// and a negative value for overdue ones.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Deadline {
    /// The deadline never expires.
    Infinite,
    /// The deadline expires at the given timestamp.
    At(Millis),
}

impl Deadline {
    /// A deadline which never expires.
    pub const INFINITE: Self = Self::Infinite;

    /// The longest delay which can be represented by a [`Deadline`].
    ///
    /// See [the type-level documentation](Self#wraparound) for details.
    pub const MAX_DELAY: Millis = i32::MAX as Millis;

    /// Returns a deadline which never expires.
    #[must_use]
    pub const fn infinite() -> Self {
        Self::Infinite
    }

    /// Returns a deadline `delay` milliseconds after the current time on
    /// `clock`.
    ///
    /// Delays longer than [`Deadline::MAX_DELAY`] are saturated to
    /// `MAX_DELAY`. For a version of this function that returns an error
    /// instead, use [`Deadline::try_after`].
    #[must_use]
    pub fn after(clock: &Clock, delay: Millis) -> Self {
        Self::after_at(clock.now(), delay)
    }

    /// Returns a deadline `delay` milliseconds after the current time on
    /// `clock`, or an error if `delay` is longer than
    /// [`Deadline::MAX_DELAY`].
    pub fn try_after(clock: &Clock, delay: Millis) -> Result<Self, TimeError> {
        if delay > Self::MAX_DELAY {
            return Err(TimeError::DelayTooLong {
                requested: delay,
                max: Self::MAX_DELAY,
            });
        }
        Ok(Self::after_at(clock.now(), delay))
    }

    /// Returns a deadline `delay` milliseconds after `now`.
    #[must_use]
    pub fn after_at(now: Millis, delay: Millis) -> Self {
        Self::At(now.wrapping_add(delay.min(Self::MAX_DELAY)))
    }

    /// Resets this deadline to expire `delay` milliseconds from the current
    /// time on `clock`.
    ///
    /// An infinite deadline becomes finite.
    pub fn reset(&mut self, clock: &Clock, delay: Millis) {
        *self = Self::after(clock, delay);
    }

    /// Returns `true` if this is an infinite deadline.
    #[must_use]
    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// Returns `true` if the current time on `clock` is at or past this
    /// deadline.
    ///
    /// Infinite deadlines never expire.
    #[must_use]
    pub fn has_expired(&self, clock: &Clock) -> bool {
        self.has_expired_at(clock.now())
    }

    /// Returns `true` if `now` is at or past this deadline.
    #[must_use]
    pub fn has_expired_at(&self, now: Millis) -> bool {
        match *self {
            Self::Infinite => false,
            Self::At(at) => signed_diff(at, now) <= 0,
        }
    }

    /// Returns the time remaining until this deadline on `clock`, or zero if
    /// it has already expired.
    ///
    /// Infinite deadlines have zero remaining time. See [the type-level
    /// documentation](Self#infinite-deadlines) for details.
    #[must_use]
    pub fn remaining(&self, clock: &Clock) -> Millis {
        self.remaining_at(clock.now())
    }

    /// Returns the time remaining from `now` until this deadline, or zero if
    /// it has already expired.
    ///
    /// Infinite deadlines have zero remaining time.
    #[must_use]
    pub fn remaining_at(&self, now: Millis) -> Millis {
        self.slack_at(now).map_or(0, |slack| slack.max(0) as Millis)
    }

    /// Returns the signed time from the current time on `clock` until this
    /// deadline, or [`None`] if it is infinite.
    ///
    /// The slack is negative once the deadline has passed, by however long
    /// it is overdue. Unlike [`Deadline::remaining`], slack therefore orders
    /// overdue deadlines by how late they are, and orders an infinite
    /// deadline after every finite one.
    #[must_use]
    pub fn slack(&self, clock: &Clock) -> Option<i32> {
        self.slack_at(clock.now())
    }

    /// Returns the signed time from `now` until this deadline, or [`None`]
    /// if it is infinite.
    #[must_use]
    pub fn slack_at(&self, now: Millis) -> Option<i32> {
        match *self {
            Self::Infinite => None,
            Self::At(at) => Some(signed_diff(at, now)),
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::Infinite
    }
}

/// `at - now`, as a signed distance on the wrapping counter.
#[inline]
fn signed_diff(at: Millis, now: Millis) -> i32 {
    at.wrapping_sub(now) as i32
}
