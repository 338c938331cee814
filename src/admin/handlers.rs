use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub fresh: bool,
    pub timeout_ms: u128,
    pub cached_status: u16,
    pub cached_degraded: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthCheckStatus {
    pub version: &'static str,
    pub health_check_failed: bool,
    pub pass_through_mode: bool,
    pub cache: Option<CacheStatus>,
}

#[derive(Debug, Serialize)]
pub struct ClusterStatus {
    pub name: String,
    pub total: u64,
    pub healthy: u64,
    pub degraded: u64,
}

pub async fn get_health_check(State(state): State<AdminState>) -> Json<HealthCheckStatus> {
    Json(health_check_status(&state))
}

pub async fn post_fail(State(state): State<AdminState>) -> Json<HealthCheckStatus> {
    state.health_check_flag.fail();
    Json(health_check_status(&state))
}

pub async fn post_ok(State(state): State<AdminState>) -> Json<HealthCheckStatus> {
    state.health_check_flag.ok();
    Json(health_check_status(&state))
}

pub async fn get_clusters(State(state): State<AdminState>) -> Json<Vec<ClusterStatus>> {
    let statuses = state
        .clusters
        .all_clusters()
        .iter()
        .map(|cluster| {
            let membership = cluster.stats().snapshot();
            ClusterStatus {
                name: cluster.name().to_string(),
                total: membership.total,
                healthy: membership.healthy,
                degraded: membership.degraded,
            }
        })
        .collect();

    Json(statuses)
}

fn health_check_status(state: &AdminState) -> HealthCheckStatus {
    let filters = state.filters.load();
    let cache = filters.cache().map(|cache| {
        let verdict = cache.cached_verdict();
        CacheStatus {
            fresh: cache.is_fresh(),
            timeout_ms: cache.timeout().as_millis(),
            cached_status: verdict.status.as_u16(),
            cached_degraded: verdict.degraded,
        }
    });

    HealthCheckStatus {
        version: env!("CARGO_PKG_VERSION"),
        health_check_failed: state.health_check_flag.is_failed(),
        pass_through_mode: filters.pass_through_mode(),
        cache,
    }
}
