//! Health check request filter.
//!
//! # States
//! ```text
//! Idle ──(headers match)──▶ Matched ──▶ PassThrough   (forwarded upstream)
//!                                  └──▶ Handling ──(end of request)──▶ Completed
//! ```
//!
//! A matched probe is handled locally when pass-through mode is off, when
//! the node is forced to fail, or when a fresh cached verdict exists.
//!
//! # Verdict on completion
//! 1. Forced failure → 503
//! 2. Cache configured → cached verdict (status + degraded)
//! 3. Cluster thresholds configured → cluster evaluation
//! 4. Otherwise → 200
//!
//! Any non-2xx verdict marks the request with `FailedLocalHealthCheck`.

use std::sync::Arc;
use std::time::Duration;

use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use thiserror::Error;

use crate::config::validation::{validate_health_check, ValidationError};
use crate::config::HealthCheckConfig;
use crate::event::Dispatcher;
use crate::health::cache::{CacheManager, Verdict};
use crate::health::cluster::ClusterHealthEvaluator;
use crate::health::context::ServerContext;
use crate::http::filter::{
    FilterCallbacks, FilterDataStatus, FilterHeadersStatus, FilterTrailersStatus, LocalReply,
    ResponseFlag, StreamFilter,
};
use crate::http::headers;
use crate::observability::metrics;
use crate::routing::{AndMatcher, Matcher, MatcherError};

/// Error building a filter configuration.
#[derive(Debug, Error)]
pub enum FilterConfigError {
    #[error("invalid health check config: {0:?}")]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error("local cluster name '{0}' is not a valid header value")]
    InvalidClusterName(String),
}

/// Where a locally-answered probe gets its verdict from.
#[derive(Debug)]
pub enum VerdictSource {
    /// Always healthy unless forced to fail.
    Default,
    /// Last verdict seen on a probe response, reused for a window.
    Cache(CacheManager),
    /// Membership of upstream clusters.
    Clusters(ClusterHealthEvaluator),
}

/// Settings shared by every filter instance built from one configuration.
#[derive(Debug)]
pub struct HealthCheckFilterConfig {
    matcher: AndMatcher,
    pass_through_mode: bool,
    source: VerdictSource,
    context: ServerContext,
    cluster_header: HeaderValue,
}

impl HealthCheckFilterConfig {
    pub fn new(
        matcher: AndMatcher,
        pass_through_mode: bool,
        source: VerdictSource,
        context: ServerContext,
    ) -> Result<Self, FilterConfigError> {
        let cluster_name = &context.local_info().cluster_name;
        let cluster_header = HeaderValue::from_str(cluster_name)
            .map_err(|_| FilterConfigError::InvalidClusterName(cluster_name.clone()))?;

        Ok(Self {
            matcher,
            pass_through_mode,
            source,
            context,
            cluster_header,
        })
    }

    /// Build from the `health_check` config section.
    ///
    /// A cache window starts a recurring timer on `dispatcher` that lives
    /// as long as the returned config.
    pub fn from_config(
        config: &HealthCheckConfig,
        context: ServerContext,
        dispatcher: &dyn Dispatcher,
    ) -> Result<Self, FilterConfigError> {
        let mut errors = Vec::new();
        validate_health_check(config, &mut errors);
        if !errors.is_empty() {
            return Err(FilterConfigError::Validation(errors));
        }

        let matcher = AndMatcher::from_config(&config.headers)?;

        let source = match config.cache_time_ms {
            Some(ms) => VerdictSource::Cache(CacheManager::new(dispatcher, Duration::from_millis(ms))),
            None if !config.cluster_min_healthy_percentages.is_empty() => VerdictSource::Clusters(
                ClusterHealthEvaluator::from_config(&config.cluster_min_healthy_percentages),
            ),
            None => VerdictSource::Default,
        };

        tracing::debug!(
            pass_through_mode = config.pass_through_mode,
            cache_time_ms = ?config.cache_time_ms,
            cluster_thresholds = config.cluster_min_healthy_percentages.len(),
            "Health check filter configured"
        );

        Self::new(matcher, config.pass_through_mode, source, context)
    }

    /// Create the filter instance for one request.
    pub fn create_filter(self: &Arc<Self>) -> HealthCheckFilter {
        HealthCheckFilter::new(self.clone())
    }

    pub fn pass_through_mode(&self) -> bool {
        self.pass_through_mode
    }

    pub fn source(&self) -> &VerdictSource {
        &self.source
    }

    pub fn context(&self) -> &ServerContext {
        &self.context
    }

    pub fn cache(&self) -> Option<&CacheManager> {
        match &self.source {
            VerdictSource::Cache(cache) => Some(cache),
            _ => None,
        }
    }

    fn should_handle(&self) -> bool {
        !self.pass_through_mode
            || self.context.health_check_failed()
            || self.cache().is_some_and(CacheManager::use_cached_response)
    }

    fn compute_verdict(&self) -> Verdict {
        match &self.source {
            VerdictSource::Cache(cache) => cache.cached_verdict(),
            VerdictSource::Clusters(evaluator) if !evaluator.is_empty() => Verdict {
                status: evaluator.evaluate(self.context.cluster_registry()).status(),
                degraded: false,
            },
            _ => Verdict::HEALTHY,
        }
    }
}

/// Per-request health check state machine.
#[derive(Debug)]
pub struct HealthCheckFilter {
    config: Arc<HealthCheckFilterConfig>,
    health_check_request: bool,
    handling: bool,
    completed: bool,
}

impl HealthCheckFilter {
    pub fn new(config: Arc<HealthCheckFilterConfig>) -> Self {
        Self {
            config,
            health_check_request: false,
            handling: false,
            completed: false,
        }
    }

    pub fn is_health_check_request(&self) -> bool {
        self.health_check_request
    }

    pub fn is_handling(&self) -> bool {
        self.handling
    }

    fn on_complete(&mut self, callbacks: &mut dyn FilterCallbacks) {
        assert!(self.handling, "health check completed without owning the request");
        assert!(!self.completed, "health check completed twice for one request");
        self.completed = true;

        let verdict = if self.config.context.health_check_failed() {
            Verdict::UNHEALTHY
        } else {
            self.config.compute_verdict()
        };

        if !verdict.status.is_success() {
            callbacks
                .stream_info()
                .set_response_flag(ResponseFlag::FailedLocalHealthCheck);
        }

        let mut reply = LocalReply::empty(verdict.status);
        if verdict.degraded {
            reply.headers.insert(headers::DEGRADED, headers::TRUE);
        }

        tracing::debug!(
            status = verdict.status.as_u16(),
            degraded = verdict.degraded,
            "Answering health check locally"
        );
        metrics::record_local_response(verdict.status.as_u16());

        callbacks.send_local_reply(reply);
    }
}

impl StreamFilter for HealthCheckFilter {
    fn decode_headers(
        &mut self,
        request: &Parts,
        end_stream: bool,
        callbacks: &mut dyn FilterCallbacks,
    ) -> FilterHeadersStatus {
        if self.config.matcher.matches(request) {
            self.health_check_request = true;
            callbacks.stream_info().set_health_check(true);
            // Probes stay out of trace sampling, children included.
            callbacks.set_sampled(false);

            if self.config.should_handle() {
                self.handling = true;
            }

            metrics::record_probe(if self.handling { "intercepted" } else { "pass_through" });
            tracing::debug!(
                path = %request.uri.path(),
                handling = self.handling,
                "Health check request matched"
            );
        }

        if end_stream && self.handling {
            self.on_complete(callbacks);
        }

        if self.handling {
            FilterHeadersStatus::StopIteration
        } else {
            FilterHeadersStatus::Continue
        }
    }

    fn decode_data(
        &mut self,
        _data: &[u8],
        end_stream: bool,
        callbacks: &mut dyn FilterCallbacks,
    ) -> FilterDataStatus {
        if end_stream && self.handling {
            self.on_complete(callbacks);
        }

        if self.handling {
            FilterDataStatus::StopIterationNoBuffer
        } else {
            FilterDataStatus::Continue
        }
    }

    fn decode_trailers(
        &mut self,
        _trailers: &HeaderMap,
        callbacks: &mut dyn FilterCallbacks,
    ) -> FilterTrailersStatus {
        if self.handling {
            self.on_complete(callbacks);
            FilterTrailersStatus::StopIteration
        } else {
            FilterTrailersStatus::Continue
        }
    }

    fn encode_headers(&mut self, status: StatusCode, headers: &mut HeaderMap) -> FilterHeadersStatus {
        if self.health_check_request {
            if let Some(cache) = self.config.cache() {
                cache.set_cached_verdict(status, headers.contains_key(headers::DEGRADED));
            }
            headers.insert(
                headers::UPSTREAM_HEALTHCHECKED_CLUSTER,
                self.config.cluster_header.clone(),
            );
        } else if self.config.context.health_check_failed() {
            headers.insert(headers::IMMEDIATE_HEALTH_CHECK_FAIL, headers::TRUE);
            metrics::record_immediate_fail();
        }

        FilterHeadersStatus::Continue
    }
}
