//! Contract implemented by proxy provider adapters.

use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::proxy::ProxyItem;

/// Optional operations a source implements.
///
/// The router consults this before dispatching `release` or `validate`;
/// sources that leave a flag off are never asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub release: bool,
    pub validate: bool,
}

impl Capabilities {
    pub const fn new(release: bool, validate: bool) -> Self {
        Self { release, validate }
    }

    pub const fn fetch_only() -> Self {
        Self::new(false, false)
    }
}

/// Result of a single source health probe.
#[derive(Debug, Clone)]
pub struct SourceHealth {
    pub source: String,
    pub healthy: bool,
    pub probed_at: SystemTime,
    pub error: Option<String>,
}

/// A provider adapter the pool can draw proxies from.
///
/// `fetch` is the only required operation. Implementations must be safe for
/// concurrent calls from a single pool and must bound their own I/O.
#[async_trait]
pub trait ProxySource: Send + Sync {
    /// Stable name tag used for attribution in items, events and errors.
    fn name(&self) -> &str;

    /// Which optional operations this source implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::fetch_only()
    }

    /// Request up to `count` items. Returning fewer is allowed; more is not.
    async fn fetch(&self, count: usize) -> Result<Vec<ProxyItem>, SourceError>;

    /// Notify the source that the pool has dropped `id`. Best-effort;
    /// only dispatched when `capabilities().release` is set.
    async fn release(&self, _id: &str) -> Result<(), SourceError> {
        Ok(())
    }

    /// Source-level sanity check for an item, such as id ownership.
    /// Only consulted when `capabilities().validate` is set.
    async fn validate(&self, _item: &ProxyItem) -> bool {
        false
    }
}
