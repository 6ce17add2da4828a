//! Behavior tests for the reqwest middleware consumer.

use std::sync::Arc;
use std::time::Duration;

use reqwest_middleware::ClientBuilder;
use rotating_proxy_pool::sources::StaticListSource;
use rotating_proxy_pool::{PoolConfig, Protocol, ProxyEndpoint, ProxyPool, ProxyPoolMiddleware};

fn dead_endpoints(ports: &[u16]) -> Vec<ProxyEndpoint> {
    // Nothing listens on these localhost ports; connects are refused fast.
    ports
        .iter()
        .map(|port| ProxyEndpoint::new("127.0.0.1", *port, Protocol::Http))
        .collect()
}

fn pool_of(ports: &[u16], retry_count: usize) -> ProxyPool {
    let config = PoolConfig::builder()
        .source(Arc::new(StaticListSource::new("local", dead_endpoints(ports))))
        .pool_size(ports.len())
        .low_water_fraction(0.5)
        .retry_count(retry_count)
        .request_timeout(Duration::from_secs(2))
        .build();
    ProxyPool::new(config).expect("valid config")
}

#[tokio::test]
async fn requests_fail_before_the_pool_is_initialized() {
    let pool = pool_of(&[9], 0);
    let client = ClientBuilder::new(reqwest::Client::new())
        .with(ProxyPoolMiddleware::new(pool))
        .build();

    let error = client
        .get("http://192.0.2.1/")
        .send()
        .await
        .expect_err("uninitialized pool cannot serve");

    assert!(
        error.to_string().contains("not initialized"),
        "unexpected error: {error}"
    );
}

#[tokio::test]
async fn failing_proxies_are_rejected_and_the_request_retried() {
    // Given: a pool of three unreachable proxies and one retry
    let pool = pool_of(&[9, 19, 29], 1);
    pool.init().await.expect("init succeeds");
    assert_eq!(pool.stats().size, 3);

    let client = ClientBuilder::new(reqwest::Client::new())
        .with(ProxyPoolMiddleware::new(pool.clone()))
        .build();

    // When: a request exhausts its attempts
    client
        .get("http://192.0.2.1/")
        .send()
        .await
        .expect_err("dead proxies cannot serve");

    // Then: each failed attempt evicted the proxy it used
    assert_eq!(pool.stats().size, 1);
}

#[tokio::test]
async fn an_exhausted_pool_surfaces_through_the_middleware() {
    let pool = pool_of(&[9], 0);
    pool.init().await.expect("init succeeds");
    let connection = pool.acquire().expect("peek");
    pool.reject(&connection).expect("drain the pool");

    let client = ClientBuilder::new(reqwest::Client::new())
        .with(ProxyPoolMiddleware::new(pool))
        .build();

    let error = client
        .get("http://192.0.2.1/")
        .send()
        .await
        .expect_err("empty pool cannot serve");

    assert!(
        error.to_string().contains("exhausted"),
        "unexpected error: {error}"
    );
}
