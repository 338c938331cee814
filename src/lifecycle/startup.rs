//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the injected capabilities (forced-failure flag, cluster registry)
//! - Build the health check filter configuration on the tokio runtime
//! - Hand out the HTTP server and admin state sharing them
//! - Rebuild the filter configuration on config reload
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A rejected reload keeps the running configuration

use std::sync::Arc;

use thiserror::Error;

use crate::admin::AdminState;
use crate::config::validation::validate_config;
use crate::config::ProxyConfig;
use crate::event::{Dispatcher, TokioDispatcher};
use crate::health::{FilterConfigError, HealthCheckFilterConfig, HealthCheckFlag, LocalInfo, ServerContext};
use crate::http::{shared_filter_config, HttpServer, ServerError, SharedFilterConfig};
use crate::upstream::ClusterManager;

/// Error type for startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("health check filter: {0}")]
    Filter(#[from] FilterConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Long-lived components of a running proxy.
pub struct Proxy {
    config: ProxyConfig,
    health_check_flag: Arc<HealthCheckFlag>,
    clusters: Arc<ClusterManager>,
    filters: SharedFilterConfig,
    dispatcher: Arc<dyn Dispatcher>,
}

impl Proxy {
    /// Build all components. Must run inside a tokio runtime.
    pub fn build(config: ProxyConfig) -> Result<Self, StartupError> {
        Self::with_dispatcher(config, Arc::new(TokioDispatcher::current()))
    }

    /// Build all components with a custom timer dispatcher.
    pub fn with_dispatcher(
        config: ProxyConfig,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<Self, StartupError> {
        let health_check_flag = Arc::new(HealthCheckFlag::new());
        let clusters = Arc::new(ClusterManager::from_config(&config.clusters));

        let filter_config =
            build_filter_config(&config, &health_check_flag, &clusters, dispatcher.as_ref())?;

        tracing::info!(
            node = %config.local.node_name,
            cluster = %config.local.cluster_name,
            clusters = config.clusters.len(),
            "Health check proxy initialized"
        );

        Ok(Self {
            config,
            health_check_flag,
            clusters,
            filters: shared_filter_config(filter_config),
            dispatcher,
        })
    }

    /// Swap in the health check settings of a new configuration.
    ///
    /// Listener, upstream and admin settings only change on restart.
    pub fn reload(&self, config: &ProxyConfig) -> Result<(), StartupError> {
        validate_config(config).map_err(FilterConfigError::Validation)?;

        // Nothing live changes until the new filter config has been built.
        let filter_config = build_filter_config(
            config,
            &self.health_check_flag,
            &self.clusters,
            self.dispatcher.as_ref(),
        )?;

        self.clusters.sync_from_config(&config.clusters);
        self.filters.store(Arc::new(filter_config));

        tracing::info!(clusters = config.clusters.len(), "Health check configuration reloaded");
        Ok(())
    }

    pub fn http_server(&self) -> Result<HttpServer, StartupError> {
        Ok(HttpServer::new(self.config.clone(), self.filters.clone())?)
    }

    pub fn admin_state(&self) -> AdminState {
        AdminState {
            health_check_flag: self.health_check_flag.clone(),
            clusters: self.clusters.clone(),
            filters: self.filters.clone(),
            api_key: Arc::from(self.config.admin.api_key.as_str()),
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn health_check_flag(&self) -> &Arc<HealthCheckFlag> {
        &self.health_check_flag
    }

    pub fn clusters(&self) -> &Arc<ClusterManager> {
        &self.clusters
    }

    pub fn filters(&self) -> &SharedFilterConfig {
        &self.filters
    }
}

fn build_filter_config(
    config: &ProxyConfig,
    health_check_flag: &Arc<HealthCheckFlag>,
    clusters: &Arc<ClusterManager>,
    dispatcher: &dyn Dispatcher,
) -> Result<HealthCheckFilterConfig, FilterConfigError> {
    let context = ServerContext::new(
        health_check_flag.clone(),
        clusters.clone(),
        LocalInfo::from(&config.local),
    );
    HealthCheckFilterConfig::from_config(&config.health_check, context, dispatcher)
}
