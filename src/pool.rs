//! Core pool manager: bounded pool, low-water refill, acquisition discipline.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use log::{info, warn};
use parking_lot::Mutex;

use crate::config::PoolConfig;
use crate::error::{ConfigError, PoolError};
use crate::events::{EventBus, EventKind, PoolEvent};
use crate::proxy::{ProxyConnection, ProxyItem};
use crate::router::SourceRouter;
use crate::source::SourceHealth;

/// Mutable pool state. Every mutation happens under one lock, and the lock
/// is never held across an await point.
struct PoolState {
    items: Vec<ProxyItem>,
    initialized: bool,
    refilling: bool,
    last_refresh: Option<SystemTime>,
}

/// Aggregate pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub size: usize,
    pub unused: usize,
    pub in_use: usize,
    pub initialized: bool,
    pub refilling: bool,
    pub last_refresh: Option<SystemTime>,
}

/// Per-item view reported by `status()`.
#[derive(Debug, Clone)]
pub struct ProxyItemStatus {
    pub id: String,
    pub source: String,
    pub in_use: bool,
    pub age: Duration,
}

/// Full pool snapshot.
#[derive(Debug, Clone)]
pub struct PoolStatus {
    pub stats: PoolStats,
    pub items: Vec<ProxyItemStatus>,
}

struct PoolInner {
    state: Mutex<PoolState>,
    router: SourceRouter,
    config: PoolConfig,
    events: Arc<EventBus>,
    init_lock: tokio::sync::Mutex<()>,
}

/// A bounded pool of proxies drawn from an ordered source list.
///
/// Acquisitions serve items in insertion order restricted to unused items.
/// Exclusive acquisition commits an item to the caller; committed items are
/// removed on `reject`/`discard`, never recycled back to unused.
///
/// Cloning is cheap and clones share the same pool.
#[derive(Clone)]
pub struct ProxyPool {
    inner: Arc<PoolInner>,
}

impl ProxyPool {
    /// Create an uninitialized pool. Fails when the configuration is invalid.
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let events = Arc::new(EventBus::new());
        let router = SourceRouter::new(config.sources.clone(), Arc::clone(&events));
        Ok(Self {
            inner: Arc::new(PoolInner {
                state: Mutex::new(PoolState {
                    items: Vec::new(),
                    initialized: false,
                    refilling: false,
                    last_refresh: None,
                }),
                router,
                config,
                events,
                init_lock: tokio::sync::Mutex::new(()),
            }),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Event bus for lifecycle subscriptions.
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// One-shot initialization. Idempotent: once a call has succeeded,
    /// subsequent calls return immediately. A failed init leaves the pool
    /// uninitialized and retryable.
    pub async fn init(&self) -> Result<(), PoolError> {
        let inner = &self.inner;
        let _serial = inner.init_lock.lock().await;
        if inner.state.lock().initialized {
            return Ok(());
        }

        match inner.router.replenish(inner.config.pool_size).await {
            Ok(batch) => {
                let size = batch.len();
                {
                    let mut state = inner.state.lock();
                    state.items = batch;
                    state.initialized = true;
                    state.last_refresh = Some(SystemTime::now());
                }
                info!("[pool] initialized with {size} proxies");
                inner.events.emit(PoolEvent::new(EventKind::PoolInitialized));
                Ok(())
            }
            Err(cause) => {
                warn!("[pool] initialization failed: {cause}");
                inner
                    .events
                    .emit(PoolEvent::new(EventKind::PoolInitFailed).with_error(cause.to_string()));
                Err(PoolError::Init(cause))
            }
        }
    }

    /// Non-exclusive acquisition: peek the first unused item without
    /// mutating any state.
    pub fn acquire(&self) -> Result<ProxyConnection, PoolError> {
        let state = self.inner.state.lock();
        if !state.initialized {
            return Err(PoolError::NotInitialized);
        }
        state
            .items
            .iter()
            .find(|item| !item.in_use)
            .map(ProxyItem::connection)
            .ok_or(PoolError::Exhausted)
    }

    /// Exclusive acquisition: commit the first unused item to the caller.
    ///
    /// Marking the item and evaluating the low-water condition happen in one
    /// critical section; the refill itself is spawned fire-and-forget, so
    /// this call never waits on source I/O.
    pub fn acquire_exclusive(&self) -> Result<ProxyConnection, PoolError> {
        let (connection, trip) = {
            let mut state = self.inner.state.lock();
            if !state.initialized {
                return Err(PoolError::NotInitialized);
            }
            let Some(item) = state.items.iter_mut().find(|item| !item.in_use) else {
                return Err(PoolError::Exhausted);
            };
            item.in_use = true;
            let connection = item.connection();

            let unused = state.items.iter().filter(|item| !item.in_use).count();
            let low_water =
                self.inner.config.pool_size as f64 * self.inner.config.low_water_fraction;
            let trip = unused as f64 <= low_water && !state.refilling;
            if trip {
                state.refilling = true;
            }
            (connection, trip)
        };

        if trip {
            self.spawn_refill();
        }
        Ok(connection)
    }

    /// Evict a failed proxy. Local only; sources are not notified.
    pub fn reject(&self, connection: &ProxyConnection) -> Result<(), PoolError> {
        let mut state = self.inner.state.lock();
        if !state.initialized {
            return Err(PoolError::NotInitialized);
        }
        state.items.retain(|item| item.id != connection.id());
        Ok(())
    }

    /// Evict a proxy and notify every release-capable source, fire-and-forget.
    ///
    /// An id no longer in the pool is a local no-op, but the release is still
    /// dispatched: the originating source may record usage past eviction.
    pub fn discard(&self, connection: &ProxyConnection) -> Result<(), PoolError> {
        {
            let mut state = self.inner.state.lock();
            if !state.initialized {
                return Err(PoolError::NotInitialized);
            }
            state.items.retain(|item| item.id != connection.id());
        }

        let pool = self.clone();
        let id = connection.id().to_string();
        tokio::spawn(async move {
            let failures = pool.inner.router.release(&id).await;
            if !failures.is_empty() {
                let message = failures
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(
                    "[pool] release of {id} reported {} failure(s)",
                    failures.len()
                );
                pool.inner
                    .events
                    .emit(PoolEvent::new(EventKind::ProxyReleaseFailed).with_error(message));
            }
        });
        Ok(())
    }

    /// Run the injected validator against a connection.
    pub async fn validate(&self, connection: &ProxyConnection) -> bool {
        self.inner.config.validator.validate(connection).await
    }

    /// Probe every configured source. Diagnostic; not used by the hot path.
    pub async fn health(&self) -> Vec<SourceHealth> {
        self.inner.router.health().await
    }

    /// Aggregate counters.
    pub fn stats(&self) -> PoolStats {
        let state = self.inner.state.lock();
        Self::stats_of(&state)
    }

    /// Aggregate counters plus a per-item breakdown.
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state.lock();
        let items = state
            .items
            .iter()
            .map(|item| ProxyItemStatus {
                id: item.id.clone(),
                source: item.source.clone(),
                in_use: item.in_use,
                age: item.age(),
            })
            .collect();
        PoolStatus {
            stats: Self::stats_of(&state),
            items,
        }
    }

    fn stats_of(state: &PoolState) -> PoolStats {
        let unused = state.items.iter().filter(|item| !item.in_use).count();
        PoolStats {
            size: state.items.len(),
            unused,
            in_use: state.items.len() - unused,
            initialized: state.initialized,
            refilling: state.refilling,
            last_refresh: state.last_refresh,
        }
    }

    fn spawn_refill(&self) {
        let pool = self.clone();
        tokio::spawn(async move {
            pool.run_refill().await;
        });
    }

    /// Restore the pool toward `pool_size`. Runs under the `refilling`
    /// latch set by `acquire_exclusive`; the latch is released on every
    /// exit path, panics included.
    async fn run_refill(&self) {
        let inner = &self.inner;
        let _latch = RefillLatch {
            state: &inner.state,
        };

        let deficit = {
            let state = inner.state.lock();
            inner.config.pool_size.saturating_sub(state.items.len())
        };
        if deficit == 0 {
            return;
        }

        match inner.router.replenish(deficit).await {
            Ok(batch) => {
                let added = batch.len();
                {
                    let mut state = inner.state.lock();
                    state.items.extend(batch);
                    state.last_refresh = Some(SystemTime::now());
                }
                info!("[pool] replenished with {added} proxies");
                inner.events.emit(PoolEvent::new(EventKind::PoolReplenished));
            }
            Err(cause) => {
                warn!("[pool] replenish failed: {cause}");
                inner.events.emit(
                    PoolEvent::new(EventKind::PoolReplenishFailed).with_error(cause.to_string()),
                );
            }
        }
    }
}

/// Clears the refill latch when the refill task unwinds or completes.
struct RefillLatch<'a> {
    state: &'a Mutex<PoolState>,
}

impl Drop for RefillLatch<'_> {
    fn drop(&mut self) {
        self.state.lock().refilling = false;
    }
}
