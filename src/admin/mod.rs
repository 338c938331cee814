//! Admin API.
//!
//! - `GET  /healthcheck`       current forced-failure flag and cache state
//! - `POST /healthcheck/fail`  force every probe to fail
//! - `POST /healthcheck/ok`    clear the forced failure
//! - `GET  /clusters`          registry membership counters

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::health::HealthCheckFlag;
use crate::http::SharedFilterConfig;
use crate::upstream::ClusterManager;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub health_check_flag: Arc<HealthCheckFlag>,
    pub clusters: Arc<ClusterManager>,
    pub filters: SharedFilterConfig,
    pub api_key: Arc<str>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/healthcheck", get(get_health_check))
        .route("/healthcheck/fail", post(post_fail))
        .route("/healthcheck/ok", post(post_ok))
        .route("/clusters", get(get_clusters))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}

/// Serve the admin API until the shutdown signal fires.
pub async fn serve_admin(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
