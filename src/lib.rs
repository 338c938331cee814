//! Health check interception for an HTTP proxy.
//!
//! Recognizes health-check probes by header predicates, answers them
//! locally with a verdict reflecting the node's or its upstream clusters'
//! health, and amortizes the cost of asking the upstream by caching the
//! last verdict for a configurable window.

pub mod admin;
pub mod config;
pub mod event;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use health::{HealthCheckFilter, HealthCheckFilterConfig};
pub use http::HttpServer;
pub use lifecycle::{Proxy, Shutdown};
