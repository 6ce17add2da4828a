//! Source over a fixed, locally configured endpoint list.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::SourceError;
use crate::proxy::{ProxyEndpoint, ProxyItem};
use crate::source::ProxySource;

/// Hands out endpoints from a configured list, cycling in order.
pub struct StaticListSource {
    name: String,
    endpoints: Vec<ProxyEndpoint>,
    cursor: AtomicUsize,
    seq: AtomicU64,
}

impl StaticListSource {
    pub fn new(name: impl Into<String>, endpoints: Vec<ProxyEndpoint>) -> Self {
        Self {
            name: name.into(),
            endpoints,
            cursor: AtomicUsize::new(0),
            seq: AtomicU64::new(0),
        }
    }

    fn next_id(&self) -> String {
        format!("{}-{}", self.name, self.seq.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[async_trait]
impl ProxySource for StaticListSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, count: usize) -> Result<Vec<ProxyItem>, SourceError> {
        if self.endpoints.is_empty() {
            return Err(SourceError::fetch(&self.name, "no endpoints configured"));
        }

        let n = count.min(self.endpoints.len());
        let start = self.cursor.fetch_add(n, Ordering::Relaxed);
        let items = (0..n)
            .map(|offset| {
                let endpoint = self.endpoints[(start + offset) % self.endpoints.len()].clone();
                ProxyItem::new(self.next_id(), &self.name, endpoint)
            })
            .collect();
        Ok(items)
    }
}
