//! Adapter for the Oculus bulk proxy API.
//!
//! One `fetch(n)` maps to one order call returning up to `n` proxies as
//! `host:port:user:pass` strings. Sessions expire server-side, so the
//! adapter does not implement `release`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response};
use serde::Serialize;

use crate::error::SourceError;
use crate::proxy::{Classification, Protocol, ProxyItem};
use crate::source::{Capabilities, ProxySource};
use crate::utils::parse_proxy_line;

const SOURCE_NAME: &str = "oculus";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const ERR_CODE_HEADER: &str = "x-tlp-err-code";
const ERR_MSG_HEADER: &str = "x-tlp-err-msg";

/// Configuration for the Oculus API source.
#[derive(Debug, Clone)]
pub struct OculusConfig {
    /// Order endpoint URL.
    pub api_url: String,
    /// Value for the `Authorization` header.
    pub auth_token: String,
    pub order_token: String,
    pub plan_type: String,
    /// Requested exit-node country, forwarded to the API and stamped on items.
    pub country: Option<String>,
    /// Order SOCKS5 endpoints instead of HTTP.
    pub enable_socks5: bool,
    pub whitelist_ips: Vec<String>,
    /// Advisory session lifetime stamped on fetched items.
    pub ttl_seconds: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderPayload<'a> {
    order_token: &'a str,
    plan_type: &'a str,
    number_of_proxies: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<&'a str>,
    enable_socks5: bool,
    #[serde(rename = "whiteListIP")]
    white_list_ip: &'a [String],
}

/// Multi-pull source backed by the Oculus order API.
pub struct OculusSource {
    config: OculusConfig,
    client: Client,
    seq: AtomicU64,
}

impl OculusSource {
    pub fn new(config: OculusConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(config, client))
    }

    /// Build with a caller-supplied client. The client must carry a timeout.
    pub fn with_client(config: OculusConfig, client: Client) -> Self {
        Self {
            config,
            client,
            seq: AtomicU64::new(0),
        }
    }

    fn next_id(&self) -> String {
        format!("{}-{}", SOURCE_NAME, self.seq.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn protocol(&self) -> Protocol {
        if self.config.enable_socks5 {
            Protocol::Socks5
        } else {
            Protocol::Http
        }
    }
}

fn header_str(response: &Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

#[async_trait]
impl ProxySource for OculusSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::new(false, true)
    }

    async fn fetch(&self, count: usize) -> Result<Vec<ProxyItem>, SourceError> {
        let payload = OrderPayload {
            order_token: &self.config.order_token,
            plan_type: &self.config.plan_type,
            number_of_proxies: count,
            country: self.config.country.as_deref(),
            enable_socks5: self.config.enable_socks5,
            white_list_ip: &self.config.whitelist_ips,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header(AUTHORIZATION, &self.config.auth_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SourceError::fetch(SOURCE_NAME, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let code = header_str(&response, ERR_CODE_HEADER);
            let message = header_str(&response, ERR_MSG_HEADER);
            return Err(SourceError::fetch(
                SOURCE_NAME,
                format!("api returned {status}: {code}: {message}"),
            ));
        }

        let entries: Vec<String> = response
            .json()
            .await
            .map_err(|e| SourceError::fetch(SOURCE_NAME, format!("malformed response: {e}")))?;
        if entries.is_empty() {
            return Err(SourceError::fetch(SOURCE_NAME, "order returned no proxies"));
        }

        let protocol = self.protocol();
        let mut items = Vec::with_capacity(entries.len().min(count));
        for entry in entries.iter().take(count) {
            let mut endpoint = parse_proxy_line(entry, protocol)
                .map_err(|e| SourceError::fetch(SOURCE_NAME, format!("malformed proxy entry: {e}")))?
                .with_classification(Classification::Residential);
            if let Some(country) = &self.config.country {
                endpoint = endpoint.with_country(country.clone());
            }

            let mut item = ProxyItem::new(self.next_id(), SOURCE_NAME, endpoint);
            if let Some(ttl) = self.config.ttl_seconds {
                item = item.with_ttl(ttl);
            }
            items.push(item);
        }

        debug!(
            "[source:{}] fetched {} of {} requested proxies",
            SOURCE_NAME,
            items.len(),
            count
        );
        Ok(items)
    }

    async fn validate(&self, item: &ProxyItem) -> bool {
        item.source == SOURCE_NAME && item.id.starts_with("oculus-")
    }
}
