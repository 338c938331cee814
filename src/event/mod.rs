//! Event scheduling subsystem.
//!
//! # Data Flow
//! ```text
//! Owner (e.g. health::cache::CacheManager)
//!     → Dispatcher::schedule_recurring(period, callback)
//!     → TimerHandle held by the owner
//!     → callback fires once per period on the dispatcher's runtime
//!
//! Owner dropped:
//!     → TimerHandle dropped
//!     → schedule cancelled, callback never fires again
//! ```
//!
//! # Design Decisions
//! - Callbacks only touch shared state through atomics/locks they own
//! - Cancellation is tied to the handle's lifetime, never manual
//! - A manually-fired dispatcher lets callers drive time themselves

pub mod timer;

pub use timer::{Dispatcher, ManualDispatcher, TimerCallback, TimerHandle, TokioDispatcher};
