//! Health check interception subsystem.
//!
//! # Data Flow
//! ```text
//! Request headers
//!     → filter.rs (probe? → pass through or handle locally)
//!     → on end of request: verdict from
//!         context.rs  (forced failure flag)
//!         cache.rs    (time-windowed cached verdict)
//!         cluster.rs  (upstream cluster membership thresholds)
//!     → local reply (200 / 503, degraded marker)
//!
//! Response headers (local or upstream)
//!     → filter.rs stores verdict in cache.rs, adds cluster / failure markers
//! ```
//!
//! # Design Decisions
//! - Cache and cluster thresholds are mutually exclusive verdict sources
//! - Policy outcomes are verdicts, never errors
//! - Capabilities (flag, registry, local identity) are injected, not global

pub mod cache;
pub mod cluster;
pub mod context;
pub mod filter;

pub use cache::{CacheManager, Verdict};
pub use cluster::{ClusterHealth, ClusterHealthEvaluator, ClusterThreshold, UnhealthyReason};
pub use context::{HealthCheckFlag, LocalInfo, ServerContext};
pub use filter::{FilterConfigError, HealthCheckFilter, HealthCheckFilterConfig, VerdictSource};
