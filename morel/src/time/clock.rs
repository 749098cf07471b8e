//! [`Clock`]s provide the scheduler's only view of time.
//!
//! See the documentation for the [`Clock`] type for more details.
use core::fmt;

/// [`Clock`] timestamps and durations are counted in milliseconds by a
/// 32-bit unsigned integer.
pub type Millis = u32;

/// The number of milliseconds after which a [`Clock`]'s counter wraps back
/// to zero: `2^32` ms, or roughly 49.7 days.
pub const WRAP_PERIOD_MS: u64 = 1 << Millis::BITS;

/// A host clock definition.
///
/// A `Clock` consists of two functions provided by the host environment:
///
/// - `now()`, which returns the current time as a [`Millis`] counter, and
/// - `sleep(ms)`, which blocks the (sole) execution context for at least
///   `ms` milliseconds.
///
/// These two functions are the entire boundary between the scheduler and the
/// platform it runs on.
///
/// # Implementing `now()`
///
/// Timestamps returned by `now()` MUST be monotonically non-decreasing,
/// *modulo* wraparound: the counter is 32 bits wide and is expected to wrap
/// every [`WRAP_PERIOD_MS`] milliseconds. Wrapping is an accepted condition;
/// [`Deadline`](super::Deadline) arithmetic is performed with wrapping
/// subtraction so that it remains meaningful across a wrap.
///
/// # Implementing `sleep()`
///
/// `sleep(ms)` must block for *at least* `ms` milliseconds. If the host can
/// interrupt the sleep (e.g. a signal arriving on a POSIX system), the
/// implementation must resume sleeping for the remaining time rather than
/// returning early or restarting the full duration.
///
/// # Examples
///
/// A clock for a timestamp counter incremented by a 1 kHz timer interrupt:
///
/// ```rust
/// use morel::time::Clock;
/// use core::sync::atomic::{AtomicU32, Ordering};
///
/// // A counter that is incremented by the hardware timer interrupt.
/// static MILLIS: AtomicU32 = AtomicU32::new(0);
///
/// fn timer_interrupt_handler() {
///     MILLIS.fetch_add(1, Ordering::Relaxed);
/// }
///
/// fn now() -> u32 {
///     MILLIS.load(Ordering::Relaxed)
/// }
///
/// fn sleep(ms: u32) {
///     let start = now();
///     while now().wrapping_sub(start) < ms {
///         // on real hardware, this would wait for an interrupt.
///         # timer_interrupt_handler();
///         core::hint::spin_loop();
///     }
/// }
///
/// let clock = Clock::new(now, sleep).named("systick");
/// assert_eq!(clock.name(), "systick");
/// ```
#[derive(Clone)]
pub struct Clock {
    now: fn() -> Millis,
    sleep: fn(Millis),
    name: &'static str,
}

impl Clock {
    /// Returns a new [`Clock`] with the provided `now()` and `sleep()`
    /// functions.
    ///
    /// See the [type-level documentation for `Clock`](Self#implementing-now)
    /// for the requirements on these functions.
    #[must_use]
    pub const fn new(now: fn() -> Millis, sleep: fn(Millis)) -> Self {
        Self {
            now,
            sleep,
            name: "<unnamed mystery clock>",
        }
    }

    /// Add an arbitrary user-defined name to this `Clock`.
    ///
    /// This is generally used to describe the hardware time source used by
    /// the `now()` function for this `Clock`.
    #[must_use]
    pub const fn named(self, name: &'static str) -> Self {
        Self { name, ..self }
    }

    /// Returns the current timestamp, in milliseconds.
    #[must_use]
    #[inline]
    pub fn now(&self) -> Millis {
        (self.now)()
    }

    /// Blocks for at least `ms` milliseconds.
    #[inline]
    pub fn sleep(&self, ms: Millis) {
        tracing::trace!(clock = self.name, ms, "sleep");
        (self.sleep)(ms)
    }

    /// Returns this `Clock`'s name, if it was given one using the
    /// [`Clock::named`] method.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("name", &self.name)
            .field("now", &format_args!("{:p}", self.now))
            .field("sleep", &format_args!("{:p}", self.sleep))
            .finish()
    }
}

feature! {
    #![feature = "std"]

    impl Clock {
        /// Returns a [`Clock`] backed by the Rust standard library.
        ///
        /// `now()` counts milliseconds elapsed since the first time this
        /// clock was read, truncated to 32 bits (so it wraps like any other
        /// [`Millis`] counter). `sleep()` uses [`std::thread::sleep`], which
        /// already resumes sleeping for the remaining time when interrupted
        /// by a signal.
        #[must_use]
        pub fn std() -> Self {
            Self::new(std_now, std_sleep).named("std")
        }
    }

    fn std_now() -> Millis {
        use std::{sync::OnceLock, time::Instant};
        static START: OnceLock<Instant> = OnceLock::new();
        let start = START.get_or_init(Instant::now);
        // truncation is the wraparound.
        start.elapsed().as_millis() as Millis
    }

    fn std_sleep(ms: Millis) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
