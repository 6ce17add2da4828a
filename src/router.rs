//! Multi-source orchestration: one fetch/release surface over an ordered
//! source list.

use std::sync::Arc;
use std::time::SystemTime;

use futures::future;
use log::{debug, warn};

use crate::error::{ReplenishError, SourceError};
use crate::events::{EventBus, EventKind, PoolEvent};
use crate::proxy::ProxyItem;
use crate::source::{ProxySource, SourceHealth};

/// Routes pool requests across heterogeneous provider adapters.
///
/// Source order is semantic: the first source is primary, the rest are
/// strict fallbacks. The router never retries internally; retry discipline
/// belongs to the pool's next replenish cycle or to the caller.
pub struct SourceRouter {
    sources: Vec<Arc<dyn ProxySource>>,
    events: Arc<EventBus>,
}

impl SourceRouter {
    pub fn new(sources: Vec<Arc<dyn ProxySource>>, events: Arc<EventBus>) -> Self {
        Self { sources, events }
    }

    /// Fetch up to `count` items from the first source that yields any.
    ///
    /// A failed fetch or an empty batch emits `source.failed` and advances
    /// to the next source; batches are never aggregated across sources.
    pub async fn replenish(&self, count: usize) -> Result<Vec<ProxyItem>, ReplenishError> {
        let mut attempts = Vec::new();

        for source in &self.sources {
            match source.fetch(count).await {
                Ok(batch) if !batch.is_empty() => {
                    debug!(
                        "[source] replenish served by '{}': {} item(s)",
                        source.name(),
                        batch.len()
                    );
                    return Ok(batch);
                }
                Ok(_) => {
                    let error = SourceError::fetch(source.name(), "returned an empty batch");
                    warn!("{error}");
                    self.events.emit(
                        PoolEvent::new(EventKind::SourceFailed)
                            .with_source(source.name())
                            .with_error(error.message()),
                    );
                    attempts.push(error);
                }
                Err(error) => {
                    warn!("{error}");
                    self.events.emit(
                        PoolEvent::new(EventKind::SourceFailed)
                            .with_source(source.name())
                            .with_error(error.message()),
                    );
                    attempts.push(error);
                }
            }
        }

        Err(ReplenishError::new(attempts))
    }

    /// Broadcast a release to every source that supports it, concurrently.
    ///
    /// Never fails; per-source failures emit `source.release.failed` and are
    /// returned for the caller to aggregate.
    pub async fn release(&self, id: &str) -> Vec<SourceError> {
        let capable: Vec<&Arc<dyn ProxySource>> = self
            .sources
            .iter()
            .filter(|source| source.capabilities().release)
            .collect();

        let results = future::join_all(
            capable
                .iter()
                .map(|source| async move { (source.name().to_string(), source.release(id).await) }),
        )
        .await;

        let mut failures = Vec::new();
        for (name, result) in results {
            if let Err(error) = result {
                warn!("{error}");
                self.events.emit(
                    PoolEvent::new(EventKind::SourceReleaseFailed)
                        .with_source(name)
                        .with_error(error.message()),
                );
                failures.push(error);
            }
        }
        failures
    }

    /// Probe every source with a single-item fetch. Diagnostic only.
    pub async fn health(&self) -> Vec<SourceHealth> {
        let mut reports = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let probed_at = SystemTime::now();
            let report = match source.fetch(1).await {
                Ok(_) => SourceHealth {
                    source: source.name().to_string(),
                    healthy: true,
                    probed_at,
                    error: None,
                },
                Err(error) => SourceHealth {
                    source: source.name().to_string(),
                    healthy: false,
                    probed_at,
                    error: Some(error.to_string()),
                },
            };
            reports.push(report);
        }
        reports
    }
}
