//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, tracing)
//!     → middleware.rs (health check filter per request)
//!         → pipeline.rs drives filter.rs hooks
//!         → local reply for held probes
//!     → server.rs proxy handler → upstream
//!     → middleware.rs runs the encode hook on the upstream response
//!     → Send to client
//! ```

pub mod filter;
pub mod headers;
pub mod middleware;
pub mod pipeline;
pub mod server;

pub use filter::{FilterCallbacks, LocalReply, ResponseFlag, StreamFilter, StreamInfo};
pub use middleware::{health_check_middleware, shared_filter_config, SharedFilterConfig};
pub use pipeline::FilterStream;
pub use server::{HttpServer, ServerError};
