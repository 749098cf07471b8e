//! The wait/notify protocol.
//!
//! A task waits on an [`Endpoint`] (the resource it is interested in), a
//! [`Channel`] (a subdivision of that resource), and an *attribute*. A
//! notification wakes every waiting task whose endpoint and channel are equal
//! to the notification's, and whose attribute is either the [`WILDCARD`] or
//! equal to the notification's attribute. One notification may therefore
//! wake several tasks.
use crate::time::{Clock, Deadline, Millis};
use core::fmt;

/// A small tag subdividing an [`Endpoint`].
pub type Channel = u8;

/// The wait attribute that matches any notification.
pub const WILDCARD: usize = 0;

/// An opaque identity naming something tasks can wait on.
///
/// Endpoints are compared only for equality. They can be made from an
/// arbitrary number with [`Endpoint::new`], or from the address of a value
/// that outlives the wait with [`Endpoint::of`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Endpoint(u64);

/// How long a task waits before it is dispatched without a notification.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Timeout {
    /// Give up after the given number of milliseconds.
    After(Millis),
    /// Wait until notified, however long that takes.
    ///
    /// Note that a task waiting forever may still be dispatched if none of
    /// its siblings has a finite deadline; it must re-check its condition
    /// either way.
    Never,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(super) struct WaitFields {
    pub(super) endpoint: Option<Endpoint>,
    pub(super) channel: Channel,
    pub(super) attribute: usize,
    pub(super) value: usize,
    pub(super) notified: bool,
}

// === impl Endpoint ===

impl Endpoint {
    /// Returns an endpoint identified by an arbitrary number.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns an endpoint identified by the address of `value`.
    ///
    /// Two endpoints made this way are equal if they were made from the same
    /// place in memory. The value is not borrowed past this call, so callers
    /// must make sure it lives at least as long as anything waits on it.
    #[must_use]
    pub fn of<T: ?Sized>(value: &T) -> Self {
        Self((value as *const T).cast::<()>() as usize as u64)
    }

    /// Returns the number identifying this endpoint.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Endpoint(")?;
        fmt::LowerHex::fmt(&self.0, f)?;
        f.write_str(")")
    }
}

// === impl Timeout ===

impl Timeout {
    pub(super) fn deadline(self, clock: &Clock) -> Deadline {
        match self {
            Self::After(ms) => Deadline::after(clock, ms),
            Self::Never => Deadline::Infinite,
        }
    }
}

impl From<Millis> for Timeout {
    fn from(ms: Millis) -> Self {
        Self::After(ms)
    }
}

// === impl WaitFields ===

impl WaitFields {
    pub(super) const fn new() -> Self {
        Self {
            endpoint: None,
            channel: 0,
            attribute: WILDCARD,
            value: 0,
            notified: false,
        }
    }

    pub(super) const fn waiting(endpoint: Endpoint, channel: Channel, attribute: usize) -> Self {
        Self {
            endpoint: Some(endpoint),
            channel,
            attribute,
            value: 0,
            notified: false,
        }
    }

    pub(super) fn matches(&self, endpoint: Endpoint, attribute: usize, channel: Channel) -> bool {
        self.endpoint == Some(endpoint)
            && self.channel == channel
            && (self.attribute == WILDCARD || self.attribute == attribute)
    }

    pub(super) fn deliver(&mut self, attribute: usize, value: usize) {
        self.attribute = attribute;
        self.value = value;
        self.notified = true;
    }
}
