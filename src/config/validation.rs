//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that the verdict sources are not combined
//! - Validate value ranges (percentages, cache window)
//! - Check header predicates and registry seed for consistency
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;

use crate::config::schema::{ClusterConfig, HeaderMatchConfig, HealthCheckConfig, ProxyConfig};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("cache_time_ms and cluster_min_healthy_percentages are mutually exclusive")]
    CacheWithClusterThresholds,

    #[error("cache_time_ms requires pass_through_mode")]
    CacheWithoutPassThrough,

    #[error("cache_time_ms must be greater than zero")]
    ZeroCacheTime,

    #[error("cluster threshold {index}: cluster name is empty")]
    EmptyThresholdCluster { index: usize },

    #[error("cluster threshold for '{cluster}' is listed more than once")]
    DuplicateThresholdCluster { cluster: String },

    #[error("cluster threshold for '{cluster}': {value} is not a percentage in [0, 100]")]
    PercentageOutOfRange { cluster: String, value: f64 },

    #[error("health_check.headers must contain at least one predicate")]
    NoHeaderPredicates,

    #[error("header predicate {index}: invalid header name '{name}'")]
    InvalidHeaderName { index: usize, name: String },

    #[error("header predicate '{name}' sets more than one of exact_match, prefix_match, present_match")]
    AmbiguousHeaderPredicate { name: String },

    #[error("local.cluster_name must not be empty")]
    EmptyLocalCluster,

    #[error("local.cluster_name '{name}' is not a valid header value")]
    InvalidLocalCluster { name: String },

    #[error("cluster '{name}' is defined more than once")]
    DuplicateCluster { name: String },

    #[error("cluster '{name}': healthy + degraded ({available}) exceeds total ({total})")]
    MembershipExceedsTotal { name: String, available: u64, total: u64 },
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_health_check(&config.health_check, &mut errors);

    let cluster_name = &config.local.cluster_name;
    if cluster_name.trim().is_empty() {
        errors.push(ValidationError::EmptyLocalCluster);
    } else if HeaderValue::from_str(cluster_name).is_err() {
        errors.push(ValidationError::InvalidLocalCluster {
            name: cluster_name.clone(),
        });
    }

    validate_clusters(&config.clusters, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks for the `health_check` section alone.
pub fn validate_health_check(config: &HealthCheckConfig, errors: &mut Vec<ValidationError>) {
    if let Some(cache_time_ms) = config.cache_time_ms {
        if !config.cluster_min_healthy_percentages.is_empty() {
            errors.push(ValidationError::CacheWithClusterThresholds);
        }
        if !config.pass_through_mode {
            errors.push(ValidationError::CacheWithoutPassThrough);
        }
        if cache_time_ms == 0 {
            errors.push(ValidationError::ZeroCacheTime);
        }
    }

    let mut seen = HashSet::new();
    for (index, threshold) in config.cluster_min_healthy_percentages.iter().enumerate() {
        if threshold.cluster.trim().is_empty() {
            errors.push(ValidationError::EmptyThresholdCluster { index });
        } else if !seen.insert(threshold.cluster.as_str()) {
            errors.push(ValidationError::DuplicateThresholdCluster {
                cluster: threshold.cluster.clone(),
            });
        }

        // NaN fails both comparisons.
        let value = threshold.min_healthy_percentage;
        if !(0.0..=100.0).contains(&value) {
            errors.push(ValidationError::PercentageOutOfRange {
                cluster: threshold.cluster.clone(),
                value,
            });
        }
    }

    if config.headers.is_empty() {
        errors.push(ValidationError::NoHeaderPredicates);
    }
    for (index, header) in config.headers.iter().enumerate() {
        validate_header(index, header, errors);
    }
}

fn validate_header(index: usize, header: &HeaderMatchConfig, errors: &mut Vec<ValidationError>) {
    let pseudo = matches!(header.name.as_str(), ":path" | ":method" | ":authority");
    if !pseudo && HeaderName::from_bytes(header.name.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName {
            index,
            name: header.name.clone(),
        });
    }

    let rules = [
        header.exact_match.is_some(),
        header.prefix_match.is_some(),
        header.present_match.is_some(),
    ];
    if rules.iter().filter(|set| **set).count() > 1 {
        errors.push(ValidationError::AmbiguousHeaderPredicate {
            name: header.name.clone(),
        });
    }
}

fn validate_clusters(clusters: &[ClusterConfig], errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for cluster in clusters {
        if !seen.insert(cluster.name.as_str()) {
            errors.push(ValidationError::DuplicateCluster {
                name: cluster.name.clone(),
            });
        }

        let available = cluster.healthy.saturating_add(cluster.degraded);
        if available > cluster.total {
            errors.push(ValidationError::MembershipExceedsTotal {
                name: cluster.name.clone(),
                available,
                total: cluster.total,
            });
        }
    }
}
