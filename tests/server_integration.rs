//! Integration tests running the proxy against a mock upstream.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use health_check_filter::admin::serve_admin;
use health_check_filter::config::{ClusterConfig, ClusterThresholdConfig};
use tokio::net::TcpListener;

mod common;

use common::MockReply;

/// Backend that counts requests and always answers `reply`.
async fn counting_backend(addr: SocketAddr, reply: MockReply) -> Arc<AtomicU32> {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    common::start_programmable_backend(addr, move || {
        let counter = counter.clone();
        let reply = reply.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            reply
        }
    })
    .await;
    calls
}

#[tokio::test]
async fn test_probe_answered_without_upstream() {
    let backend_addr: SocketAddr = "127.0.0.1:28281".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28282".parse().unwrap();
    let calls = counting_backend(backend_addr, MockReply::ok("upstream")).await;

    let (_proxy, shutdown) = common::start_proxy(common::proxy_config(proxy_addr, backend_addr)).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/healthcheck", proxy_addr))
        .send()
        .await
        .expect("Proxy unreachable");
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("x-envoy-upstream-healthchecked-cluster").unwrap(),
        "local"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0, "Probe must not reach the upstream");

    let res = client.get(format!("http://{}/api", proxy_addr)).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().get("x-envoy-upstream-healthchecked-cluster").is_none());
    assert_eq!(res.text().await.unwrap(), "upstream");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_forced_failure_end_to_end() {
    let backend_addr: SocketAddr = "127.0.0.1:28283".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28284".parse().unwrap();
    let _calls = counting_backend(backend_addr, MockReply::ok("upstream")).await;

    let (proxy, shutdown) = common::start_proxy(common::proxy_config(proxy_addr, backend_addr)).await;
    let client = common::client();

    proxy.health_check_flag().fail();

    let res = client
        .get(format!("http://{}/healthcheck", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);

    let res = client.get(format!("http://{}/api", proxy_addr)).send().await.unwrap();
    assert_eq!(res.status(), 200, "Regular traffic keeps its status");
    assert_eq!(
        res.headers().get("x-envoy-immediate-health-check-fail").unwrap(),
        "true"
    );

    proxy.health_check_flag().ok();
    let res = client
        .get(format!("http://{}/healthcheck", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}

#[tokio::test]
async fn test_pass_through_probe_cached() {
    let backend_addr: SocketAddr = "127.0.0.1:28285".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28286".parse().unwrap();
    let calls = counting_backend(
        backend_addr,
        MockReply {
            status: 503,
            headers: vec![("x-envoy-degraded", "true")],
            body: "down".to_string(),
        },
    )
    .await;

    let mut config = common::proxy_config(proxy_addr, backend_addr);
    config.health_check.pass_through_mode = true;
    config.health_check.cache_time_ms = Some(60_000);
    let (_proxy, shutdown) = common::start_proxy(config).await;
    let client = common::client();

    let first = client
        .get(format!("http://{}/healthcheck", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 503);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let second = client
        .get(format!("http://{}/healthcheck", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 503);
    assert_eq!(second.headers().get("x-envoy-degraded").unwrap(), "true");
    assert_eq!(calls.load(Ordering::SeqCst), 1, "Second probe served from cache");

    shutdown.trigger();
}

#[tokio::test]
async fn test_cluster_threshold_verdict() {
    let backend_addr: SocketAddr = "127.0.0.1:28287".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28288".parse().unwrap();
    let _calls = counting_backend(backend_addr, MockReply::ok("upstream")).await;

    let mut config = common::proxy_config(proxy_addr, backend_addr);
    config.clusters.push(ClusterConfig {
        name: "api".into(),
        total: 10,
        healthy: 2,
        degraded: 0,
    });
    config.health_check.cluster_min_healthy_percentages.push(ClusterThresholdConfig {
        cluster: "api".into(),
        min_healthy_percentage: 50.0,
    });
    let (_proxy, shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .get(format!("http://{}/healthcheck", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);

    shutdown.trigger();
}

#[tokio::test]
async fn test_admin_api_toggles_failure() {
    let backend_addr: SocketAddr = "127.0.0.1:28289".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28290".parse().unwrap();
    let admin_addr: SocketAddr = "127.0.0.1:28291".parse().unwrap();
    let _calls = counting_backend(backend_addr, MockReply::ok("upstream")).await;

    let mut config = common::proxy_config(proxy_addr, backend_addr);
    config.admin.enabled = true;
    config.admin.api_key = "test-key".into();
    config.admin.bind_address = admin_addr.to_string();
    let (proxy, shutdown) = common::start_proxy(config).await;

    let admin_listener = TcpListener::bind(admin_addr).await.unwrap();
    tokio::spawn(serve_admin(admin_listener, proxy.admin_state(), shutdown.subscribe()));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let client = common::client();

    let res = client
        .post(format!("http://{}/healthcheck/fail", admin_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
    assert!(!proxy.health_check_flag().is_failed());

    let res = client
        .post(format!("http://{}/healthcheck/fail", admin_addr))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let status: serde_json::Value = res.json().await.unwrap();
    assert_eq!(status["health_check_failed"], true);

    let res = client
        .get(format!("http://{}/healthcheck", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 503);

    let res = client
        .post(format!("http://{}/healthcheck/ok", admin_addr))
        .bearer_auth("test-key")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client
        .get(format!("http://{}/healthcheck", proxy_addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    shutdown.trigger();
}
