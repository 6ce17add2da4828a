//! Middleware that routes reqwest requests through the pool.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use log::{info, warn};
use parking_lot::Mutex;
use reqwest_middleware::{Error, Middleware, Next, Result};

use crate::pool::ProxyPool;
use crate::proxy::ProxyConnection;

type ProxyLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Middleware that sends each request through a pooled proxy.
///
/// Uses non-exclusive acquisition: a proxy that serves the request stays in
/// the pool for the next caller; a proxy that fails it is rejected and the
/// request is retried with the next one, up to the configured retry count.
pub struct ProxyPoolMiddleware {
    pool: ProxyPool,
    limiters: Mutex<HashMap<String, Arc<ProxyLimiter>>>,
}

impl ProxyPoolMiddleware {
    pub fn new(pool: ProxyPool) -> Self {
        Self {
            pool,
            limiters: Mutex::new(HashMap::new()),
        }
    }

    /// Per-proxy rate limiter, created lazily on first use.
    fn limiter_for(&self, id: &str) -> Arc<ProxyLimiter> {
        let mut limiters = self.limiters.lock();
        Arc::clone(limiters.entry(id.to_string()).or_insert_with(|| {
            let rps = self.pool.config().max_requests_per_second;
            let quota = Quota::per_second(
                NonZeroU32::new(rps.ceil() as u32).unwrap_or(NonZeroU32::new(1).unwrap()),
            );
            Arc::new(RateLimiter::direct(quota))
        }))
    }

    fn evict(&self, connection: &ProxyConnection) {
        self.limiters.lock().remove(connection.id());
        if let Err(err) = self.pool.reject(connection) {
            warn!("[middleware] reject of {} failed: {err}", connection.id());
        }
    }
}

#[async_trait]
impl Middleware for ProxyPoolMiddleware {
    async fn handle(
        &self,
        req: reqwest::Request,
        _extensions: &mut http::Extensions,
        _next: Next<'_>,
    ) -> Result<reqwest::Response> {
        let max_retries = self.pool.config().retry_count;
        let mut attempt = 0;

        loop {
            let connection = match self.pool.acquire() {
                Ok(connection) => connection,
                Err(err) => {
                    warn!("[middleware] no proxy available: {err}");
                    return Err(Error::Middleware(anyhow!(err)));
                }
            };

            let proxied_request = req.try_clone().ok_or_else(|| {
                Error::Middleware(anyhow!(
                    "request is not cloneable; streaming bodies are unsupported"
                ))
            })?;

            info!(
                "[middleware] using proxy {} (attempt {})",
                connection.id(),
                attempt + 1
            );

            self.limiter_for(connection.id()).until_ready().await;

            let reqwest_proxy = match connection.to_reqwest_proxy() {
                Ok(proxy) => proxy,
                Err(err) => {
                    warn!("[middleware] unusable proxy {}: {err}", connection.id());
                    self.evict(&connection);
                    attempt += 1;
                    if attempt > max_retries {
                        return Err(Error::Reqwest(err));
                    }
                    continue;
                }
            };

            let client = match reqwest::Client::builder()
                .proxy(reqwest_proxy)
                .timeout(self.pool.config().request_timeout)
                .build()
            {
                Ok(client) => client,
                Err(err) => {
                    warn!(
                        "[middleware] failed to build client for {}: {err}",
                        connection.id()
                    );
                    self.evict(&connection);
                    attempt += 1;
                    if attempt > max_retries {
                        return Err(Error::Reqwest(err));
                    }
                    continue;
                }
            };

            match client.execute(proxied_request).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    warn!(
                        "[middleware] request through {} failed (attempt {}): {err}",
                        connection.id(),
                        attempt + 1
                    );
                    self.evict(&connection);
                    attempt += 1;
                    if attempt > max_retries {
                        return Err(Error::Reqwest(err));
                    }
                }
            }
        }
    }
}
