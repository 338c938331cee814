//! Cluster registry.
//!
//! # Responsibilities
//! - Resolve cluster names to clusters
//! - Seed clusters from configuration
//! - Allow clusters to be added and removed at runtime

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::ClusterConfig;
use crate::upstream::cluster::{Cluster, MembershipSnapshot};

/// Name → cluster lookup consumed by the health check filter.
pub trait ClusterRegistry: Send + Sync {
    /// Resolve a cluster by name.
    fn get(&self, name: &str) -> Option<Arc<Cluster>>;
}

/// In-memory cluster registry.
#[derive(Debug, Default)]
pub struct ClusterManager {
    clusters: DashMap<String, Arc<Cluster>>,
}

impl ClusterManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded from configuration.
    pub fn from_config(configs: &[ClusterConfig]) -> Self {
        let manager = Self::new();
        manager.sync_from_config(configs);
        manager
    }

    /// Insert a cluster, or update the membership of an existing one.
    pub fn add_or_update(&self, name: &str, membership: MembershipSnapshot) -> Arc<Cluster> {
        match self.clusters.entry(name.to_string()) {
            Entry::Occupied(entry) => {
                entry.get().stats().set(membership);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                tracing::debug!(cluster = %name, total = membership.total, "Cluster added");
                let cluster = Arc::new(Cluster::new(name, membership));
                entry.insert(cluster.clone());
                cluster
            }
        }
    }

    /// Make the registry match `configs`: update listed clusters and drop
    /// any that are no longer listed.
    pub fn sync_from_config(&self, configs: &[ClusterConfig]) {
        for config in configs {
            self.add_or_update(
                &config.name,
                MembershipSnapshot {
                    total: config.total,
                    healthy: config.healthy,
                    degraded: config.degraded,
                },
            );
        }

        let listed: HashSet<&str> = configs.iter().map(|c| c.name.as_str()).collect();
        let stale: Vec<String> = self
            .clusters
            .iter()
            .filter(|entry| !listed.contains(entry.key().as_str()))
            .map(|entry| entry.key().clone())
            .collect();
        for name in stale {
            self.remove(&name);
        }
    }

    /// Remove a cluster. Returns true if it existed.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.clusters.remove(name).is_some();
        if removed {
            tracing::debug!(cluster = %name, "Cluster removed");
        }
        removed
    }

    /// All clusters, sorted by name.
    pub fn all_clusters(&self) -> Vec<Arc<Cluster>> {
        let mut clusters: Vec<_> = self.clusters.iter().map(|r| r.value().clone()).collect();
        clusters.sort_by(|a, b| a.name().cmp(b.name()));
        clusters
    }
}

impl ClusterRegistry for ClusterManager {
    fn get(&self, name: &str) -> Option<Arc<Cluster>> {
        self.clusters.get(name).map(|r| r.value().clone())
    }
}
