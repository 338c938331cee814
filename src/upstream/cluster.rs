//! Upstream cluster abstraction.
//!
//! # Responsibilities
//! - Represent a named upstream cluster
//! - Hold membership counters (total, healthy, degraded hosts)
//! - Hand out consistent point-in-time snapshots

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

/// Point-in-time membership counts of a cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MembershipSnapshot {
    pub total: u64,
    pub healthy: u64,
    pub degraded: u64,
}

impl MembershipSnapshot {
    /// Hosts able to take traffic (healthy + degraded).
    pub fn available(&self) -> u64 {
        self.healthy.saturating_add(self.degraded)
    }
}

/// Membership counters of a cluster.
///
/// Updated by whatever tracks host health; read by the health check filter.
/// The three counts are swapped as one value, so a reader never sees a mix
/// of old and new counts.
#[derive(Debug, Default)]
pub struct MembershipStats {
    current: ArcSwap<MembershipSnapshot>,
}

impl MembershipStats {
    pub fn snapshot(&self) -> MembershipSnapshot {
        **self.current.load()
    }

    /// Replace all counters.
    pub fn set(&self, snapshot: MembershipSnapshot) {
        self.current.store(Arc::new(snapshot));
    }
}

/// A single upstream cluster.
#[derive(Debug)]
pub struct Cluster {
    name: String,
    stats: MembershipStats,
}

impl Cluster {
    pub fn new(name: impl Into<String>, membership: MembershipSnapshot) -> Self {
        let stats = MembershipStats::default();
        stats.set(membership);
        Self {
            name: name.into(),
            stats,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> &MembershipStats {
        &self.stats
    }
}
