//! Health check proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client / load balancer probe
//!     ─────────────────────────────┐
//!                                  ▼
//!     ┌──────────────────────────────────────────────────────┐
//!     │  axum server (trace, request id, timeout)            │
//!     │      │                                               │
//!     │      ▼                                               │
//!     │  health check middleware ──probe held──▶ local reply │
//!     │      │ (flag / cache / cluster thresholds)           │
//!     │      ▼ not held                                      │
//!     │  proxy handler ──────────────────────────────────────┼──▶ Upstream
//!     │      ▲                                               │
//!     │      └── encode hook: cache verdict, add markers ◀───┼─── response
//!     └──────────────────────────────────────────────────────┘
//!     Admin API: /healthcheck/fail, /healthcheck/ok, /clusters
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use health_check_filter::admin::serve_admin;
use health_check_filter::config::watcher::ConfigWatcher;
use health_check_filter::config::{load_config, ProxyConfig};
use health_check_filter::lifecycle::{Proxy, Shutdown};
use health_check_filter::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "health-check-proxy")]
#[command(about = "HTTP proxy answering health-check probes locally", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload health check settings when the config file changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "health-check-proxy starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let proxy = Arc::new(Proxy::build(config.clone())?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = proxy.http_server()?;
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let admin_task = if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        Some(tokio::spawn(serve_admin(
            admin_listener,
            proxy.admin_state(),
            shutdown.subscribe(),
        )))
    } else {
        None
    };

    // Held for the lifetime of the process; dropping it stops watching.
    let _watcher = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let watcher = watcher.run()?;
            let proxy = proxy.clone();
            tokio::spawn(async move {
                while let Some(new_config) = updates.recv().await {
                    if let Err(e) = proxy.reload(&new_config) {
                        tracing::error!(error = %e, "Rejected configuration reload");
                    }
                }
            });
            Some(watcher)
        }
        _ => None,
    };

    shutdown.trigger_on_ctrl_c().await?;

    server_task.await??;
    if let Some(task) = admin_task {
        task.await??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
