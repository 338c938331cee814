//! Multi-cluster health aggregation.
//!
//! # Rules
//! ```text
//! for each threshold, in configured order:
//!     cluster unknown                       → unhealthy, stop
//!     total == 0 and minimum == 0           → pass
//!     total == 0                            → unhealthy, stop
//!     healthy + degraded < total * min/100  → unhealthy, stop
//! all passed                                → healthy
//! ```
//!
//! # Design Decisions
//! - Pure over a registry snapshot; no retries, no partial results
//! - First failing cluster decides the outcome
//! - Equality with the minimum passes

use axum::http::StatusCode;

use crate::config::ClusterThresholdConfig;
use crate::observability::metrics;
use crate::upstream::ClusterRegistry;

/// Minimum available share required of one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterThreshold {
    pub cluster: String,
    pub min_healthy_percentage: f64,
}

impl From<&ClusterThresholdConfig> for ClusterThreshold {
    fn from(config: &ClusterThresholdConfig) -> Self {
        Self {
            cluster: config.cluster.clone(),
            min_healthy_percentage: config.min_healthy_percentage,
        }
    }
}

/// Why a cluster failed its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnhealthyReason {
    /// Not known to the registry.
    Missing,
    /// No members while a non-zero minimum is required.
    Empty,
    /// Too few healthy + degraded members.
    BelowThreshold { available: u64, total: u64 },
}

impl UnhealthyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Empty => "empty",
            Self::BelowThreshold { .. } => "below_threshold",
        }
    }
}

/// Outcome of evaluating all thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterHealth {
    Healthy,
    Unhealthy {
        cluster: String,
        reason: UnhealthyReason,
    },
}

impl ClusterHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    pub fn status(&self) -> StatusCode {
        if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Turns cluster membership into a healthy/unhealthy verdict.
#[derive(Debug, Clone, Default)]
pub struct ClusterHealthEvaluator {
    thresholds: Vec<ClusterThreshold>,
}

impl ClusterHealthEvaluator {
    pub fn new(thresholds: Vec<ClusterThreshold>) -> Self {
        Self { thresholds }
    }

    pub fn from_config(configs: &[ClusterThresholdConfig]) -> Self {
        Self::new(configs.iter().map(ClusterThreshold::from).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn thresholds(&self) -> &[ClusterThreshold] {
        &self.thresholds
    }

    /// Evaluate thresholds in order, stopping at the first failure.
    pub fn evaluate(&self, registry: &dyn ClusterRegistry) -> ClusterHealth {
        for threshold in &self.thresholds {
            if let Some(reason) = check_threshold(threshold, registry) {
                tracing::warn!(
                    cluster = %threshold.cluster,
                    reason = reason.as_str(),
                    min_healthy_percentage = threshold.min_healthy_percentage,
                    "Cluster below minimum health"
                );
                metrics::record_cluster_unhealthy(&threshold.cluster, reason.as_str());
                return ClusterHealth::Unhealthy {
                    cluster: threshold.cluster.clone(),
                    reason,
                };
            }
        }
        ClusterHealth::Healthy
    }
}

fn check_threshold(
    threshold: &ClusterThreshold,
    registry: &dyn ClusterRegistry,
) -> Option<UnhealthyReason> {
    let Some(cluster) = registry.get(&threshold.cluster) else {
        return Some(UnhealthyReason::Missing);
    };

    let membership = cluster.stats().snapshot();
    if membership.total == 0 {
        return if threshold.min_healthy_percentage == 0.0 {
            None
        } else {
            Some(UnhealthyReason::Empty)
        };
    }

    // Compared without dividing so equality is exact for whole percentages.
    let available = membership.available();
    let required = membership.total as f64 * threshold.min_healthy_percentage / 100.0;
    if (available as f64) < required {
        Some(UnhealthyReason::BelowThreshold {
            available,
            total: membership.total,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{ClusterManager, MembershipSnapshot};

    fn threshold(cluster: &str, pct: f64) -> ClusterThreshold {
        ClusterThreshold {
            cluster: cluster.to_string(),
            min_healthy_percentage: pct,
        }
    }

    fn registry() -> ClusterManager {
        let manager = ClusterManager::new();
        manager.add_or_update("empty", MembershipSnapshot::default());
        manager.add_or_update("c", MembershipSnapshot { total: 100, healthy: 50, degraded: 10 });
        manager
    }

    #[test]
    fn test_missing_cluster_is_unhealthy() {
        let evaluator = ClusterHealthEvaluator::new(vec![threshold("a", 0.0)]);
        assert_eq!(
            evaluator.evaluate(&registry()),
            ClusterHealth::Unhealthy { cluster: "a".into(), reason: UnhealthyReason::Missing }
        );
    }

    #[test]
    fn test_empty_cluster() {
        let registry = registry();

        let zero = ClusterHealthEvaluator::new(vec![threshold("empty", 0.0)]);
        assert!(zero.evaluate(&registry).is_healthy());

        let five = ClusterHealthEvaluator::new(vec![threshold("empty", 5.0)]);
        assert_eq!(
            five.evaluate(&registry),
            ClusterHealth::Unhealthy { cluster: "empty".into(), reason: UnhealthyReason::Empty }
        );
    }

    #[test]
    fn test_degraded_counts_as_available() {
        let registry = registry();

        assert!(ClusterHealthEvaluator::new(vec![threshold("c", 50.0)]).evaluate(&registry).is_healthy());
        assert!(ClusterHealthEvaluator::new(vec![threshold("c", 60.0)]).evaluate(&registry).is_healthy());

        let verdict = ClusterHealthEvaluator::new(vec![threshold("c", 61.0)]).evaluate(&registry);
        assert_eq!(
            verdict,
            ClusterHealth::Unhealthy {
                cluster: "c".into(),
                reason: UnhealthyReason::BelowThreshold { available: 60, total: 100 },
            }
        );
        assert_eq!(verdict.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_first_failure_short_circuits() {
        let registry = registry();
        let evaluator = ClusterHealthEvaluator::new(vec![
            threshold("empty", 0.0),
            threshold("c", 90.0),
            threshold("missing", 0.0),
        ]);

        match evaluator.evaluate(&registry) {
            ClusterHealth::Unhealthy { cluster, .. } => assert_eq!(cluster, "c"),
            ClusterHealth::Healthy => panic!("expected unhealthy"),
        }
    }

    #[test]
    fn test_no_thresholds_is_healthy() {
        let evaluator = ClusterHealthEvaluator::default();
        assert!(evaluator.is_empty());
        assert_eq!(evaluator.evaluate(&registry()).status(), StatusCode::OK);
    }
}
