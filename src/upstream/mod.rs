//! Upstream cluster subsystem.
//!
//! # Data Flow
//! ```text
//! ClusterConfig[] (static seed) / runtime updates
//!     → manager.rs (name → Arc<Cluster>)
//!     → cluster.rs (atomic membership counters)
//!
//! Health check filter:
//!     ClusterRegistry::get(name)
//!     → MembershipStats::snapshot()
//! ```
//!
//! # Design Decisions
//! - Counters are atomics; readers never block writers
//! - How membership is computed is outside this crate; the registry only stores it

pub mod cluster;
pub mod manager;

pub use cluster::{Cluster, MembershipSnapshot, MembershipStats};
pub use manager::{ClusterManager, ClusterRegistry};
