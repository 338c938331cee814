//! Capabilities injected into the health check filter.
//!
//! # Responsibilities
//! - Process-wide forced-failure flag
//! - Cluster registry lookup
//! - Identity of the local node

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::LocalInfoConfig;
use crate::upstream::ClusterRegistry;

/// Administrative "fail health checks" switch.
#[derive(Debug, Default)]
pub struct HealthCheckFlag {
    failed: AtomicBool,
}

impl HealthCheckFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force every probe to be answered unhealthy.
    pub fn fail(&self) {
        if !self.failed.swap(true, Ordering::Relaxed) {
            tracing::info!("Health checks forced to fail");
        }
    }

    /// Clear a forced failure.
    pub fn ok(&self) {
        if self.failed.swap(false, Ordering::Relaxed) {
            tracing::info!("Forced health check failure cleared");
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Identity of the local node.
#[derive(Debug, Clone)]
pub struct LocalInfo {
    pub cluster_name: String,
    pub node_name: String,
}

impl From<&LocalInfoConfig> for LocalInfo {
    fn from(config: &LocalInfoConfig) -> Self {
        Self {
            cluster_name: config.cluster_name.clone(),
            node_name: config.node_name.clone(),
        }
    }
}

/// Read-only services shared by every filter built from one configuration.
#[derive(Clone)]
pub struct ServerContext {
    health_check_failed: Arc<HealthCheckFlag>,
    clusters: Arc<dyn ClusterRegistry>,
    local_info: Arc<LocalInfo>,
}

impl ServerContext {
    pub fn new(
        health_check_failed: Arc<HealthCheckFlag>,
        clusters: Arc<dyn ClusterRegistry>,
        local_info: LocalInfo,
    ) -> Self {
        Self {
            health_check_failed,
            clusters,
            local_info: Arc::new(local_info),
        }
    }

    pub fn health_check_failed(&self) -> bool {
        self.health_check_failed.is_failed()
    }

    pub fn health_check_flag(&self) -> &Arc<HealthCheckFlag> {
        &self.health_check_failed
    }

    pub fn cluster_registry(&self) -> &dyn ClusterRegistry {
        self.clusters.as_ref()
    }

    pub fn local_info(&self) -> &LocalInfo {
        &self.local_info
    }
}

impl std::fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerContext")
            .field("health_check_failed", &self.health_check_failed())
            .field("local_info", &self.local_info)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_toggle() {
        let flag = HealthCheckFlag::new();
        assert!(!flag.is_failed());
        flag.fail();
        flag.fail();
        assert!(flag.is_failed());
        flag.ok();
        assert!(!flag.is_failed());
    }
}
