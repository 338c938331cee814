//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build flag, registry, filter config → Start servers
//!
//! Reload (startup.rs):
//!     New config → Rebuild filter config → Atomic swap
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → Broadcast → Servers drain and exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then listeners
//! - Ordered shutdown: stop accept, drain, close

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{Proxy, StartupError};
