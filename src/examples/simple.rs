//! Simple example of using rotating-proxy-pool.

use std::sync::Arc;

use reqwest_middleware::ClientBuilder;
use rotating_proxy_pool::sources::StaticListSource;
use rotating_proxy_pool::{EventKind, PoolConfig, ProxyEndpoint, ProxyPool, ProxyPoolMiddleware};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // A local static list stands in for a paid provider here; swap in
    // OculusSource / ProxyMeshSource for real vendors.
    let endpoints = vec![
        ProxyEndpoint::from_url("socks5://127.0.0.1:1080")?,
        ProxyEndpoint::from_url("socks5://127.0.0.1:1081")?,
    ];
    let source = Arc::new(StaticListSource::new("local", endpoints));

    let config = PoolConfig::builder()
        .source(source)
        .pool_size(5)
        .low_water_fraction(0.4)
        .retry_count(2)
        .max_requests_per_second(3.0)
        .build();

    let pool = ProxyPool::new(config)?;
    pool.events().subscribe(EventKind::PoolReplenished, |event| {
        println!("pool replenished at {:?}", event.at);
    });

    println!("Initializing proxy pool...");
    pool.init().await?;
    println!("Pool ready: {:?}", pool.stats());

    let client = ClientBuilder::new(reqwest::Client::new())
        .with(ProxyPoolMiddleware::new(pool.clone()))
        .build();

    println!("Sending request...");
    let response = client.get("https://httpbin.org/ip").send().await?;

    println!("Status: {}", response.status());
    println!("Response: {}", response.text().await?);

    Ok(())
}
