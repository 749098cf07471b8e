//! A single-threaded, non-preemptive cooperative scheduler.
//!
//! `morel` runs lightweight *tasks*: values implementing [`Work`] that
//! perform one discrete unit of work each time they are dispatched and then
//! return control to the [`Scheduler`]. There is no preemption, no stack
//! switching, and no threads. Tasks are picked in round-robin order, with
//! ties broken by whichever task's [`Deadline`] is closest, and tasks may
//! block on a condition-variable-like wait/notify protocol keyed by an
//! [`Endpoint`], a channel, and an optional attribute.
//!
//! The scheduler only needs two things from its host environment, both
//! bundled in a [`Clock`]: a wrapping millisecond counter and a blocking
//! sleep. This makes it suitable for firmware and simulation loops where a
//! full operating system is not available. The crate is `no_std` (it
//! requires `alloc`); enabling the "std" feature adds [`Clock::std`].
//!
//! # Examples
//!
//! ```
//! use morel::{Clock, Context, Outcome, Scheduler};
//! # use core::sync::atomic::{AtomicU32, Ordering};
//! # static NOW: AtomicU32 = AtomicU32::new(0);
//! # fn now() -> u32 { NOW.load(Ordering::Relaxed) }
//! # fn sleep(ms: u32) { NOW.fetch_add(ms, Ordering::Relaxed); }
//!
//! let clock = Clock::new(now, sleep).named("example");
//! let mut scheduler = Scheduler::new(clock);
//!
//! let mut remaining = 3;
//! scheduler.build_task().name("countdown").nice(10).spawn(move |cx: &mut Context<'_>| {
//!     remaining -= 1;
//!     if remaining == 0 {
//!         cx.exit();
//!     }
//!     Outcome::Success
//! });
//!
//! scheduler.run();
//! assert!(scheduler.is_empty());
//! ```
//!
//! [`Work`]: crate::task::Work
//! [`Deadline`]: crate::time::Deadline
//! [`Endpoint`]: crate::task::Endpoint
//! [`Clock`]: crate::time::Clock
//! [`Clock::std`]: crate::time::Clock::std
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(any(test, feature = "std")), no_std)]
extern crate alloc;

#[macro_use]
pub(crate) mod util;

pub mod error;
pub mod registry;
pub mod scheduler;
pub mod task;
pub mod time;

pub use self::{
    error::Error,
    scheduler::{Context, Exit, Scheduler, Tick},
    task::{Endpoint, Outcome, TaskId, TaskState, Work},
    time::{Clock, Deadline, Millis},
};
