//! Response marker headers.

use axum::http::{HeaderName, HeaderValue};

/// Name of the local node's cluster, set on every probe response.
pub const UPSTREAM_HEALTHCHECKED_CLUSTER: HeaderName =
    HeaderName::from_static("x-envoy-upstream-healthchecked-cluster");

/// Present when the responding host is healthy but degraded.
pub const DEGRADED: HeaderName = HeaderName::from_static("x-envoy-degraded");

/// Set on non-probe responses while the node is administratively failed.
pub const IMMEDIATE_HEALTH_CHECK_FAIL: HeaderName =
    HeaderName::from_static("x-envoy-immediate-health-check-fail");

pub const TRUE: HeaderValue = HeaderValue::from_static("true");
