//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the health-check proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream that non-intercepted requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Identity of the local node.
    pub local: LocalInfoConfig,

    /// Health check filter settings.
    pub health_check: HealthCheckConfig,

    /// Static seed for the cluster registry.
    pub clusters: Vec<ClusterConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Upstream server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Local node identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalInfoConfig {
    /// Cluster the local node belongs to, echoed on probe responses.
    pub cluster_name: String,

    /// Node name for logging.
    pub node_name: String,
}

impl Default for LocalInfoConfig {
    fn default() -> Self {
        Self {
            cluster_name: "local".to_string(),
            node_name: "node-0".to_string(),
        }
    }
}

/// Health check filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Predicates selecting probe requests (AND semantics).
    pub headers: Vec<HeaderMatchConfig>,

    /// Forward probes upstream unless failing or a cached verdict is usable.
    pub pass_through_mode: bool,

    /// Validity window of a cached verdict in milliseconds.
    pub cache_time_ms: Option<u64>,

    /// Ordered cluster thresholds consulted when answering locally.
    pub cluster_min_healthy_percentages: Vec<ClusterThresholdConfig>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            headers: vec![HeaderMatchConfig {
                name: ":path".to_string(),
                exact_match: Some("/healthcheck".to_string()),
                prefix_match: None,
                present_match: None,
                invert_match: false,
            }],
            pass_through_mode: false,
            cache_time_ms: None,
            cluster_min_healthy_percentages: Vec::new(),
        }
    }
}

/// A single header predicate.
///
/// Exactly one of `exact_match`, `prefix_match` or `present_match` may be
/// set; none set means "header present".
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeaderMatchConfig {
    /// Header name, or `:path`, `:method`, `:authority`.
    pub name: String,

    #[serde(default)]
    pub exact_match: Option<String>,

    #[serde(default)]
    pub prefix_match: Option<String>,

    #[serde(default)]
    pub present_match: Option<bool>,

    /// Negate the predicate.
    #[serde(default)]
    pub invert_match: bool,
}

/// Minimum share of available hosts required of one cluster.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterThresholdConfig {
    /// Cluster name as known to the registry.
    pub cluster: String,

    /// Percentage in [0, 100] of healthy + degraded hosts.
    pub min_healthy_percentage: f64,
}

/// Static cluster membership.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterConfig {
    /// Unique cluster name.
    pub name: String,

    #[serde(default)]
    pub total: u64,

    #[serde(default)]
    pub healthy: u64,

    #[serde(default)]
    pub degraded: u64,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Full,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Log line formatting.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Pretty,
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
