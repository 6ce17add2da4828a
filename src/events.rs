//! Lifecycle events published by the pool and the source router.
//!
//! Delivery is synchronous on whichever task emits, so handlers must be
//! cheap and non-blocking.

use std::fmt;
use std::time::SystemTime;

use parking_lot::RwLock;

/// Kind of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `init()` succeeded.
    PoolInitialized,
    /// `init()` failed.
    PoolInitFailed,
    /// A background refill added at least one item.
    PoolReplenished,
    /// A background refill failed.
    PoolReplenishFailed,
    /// A fire-and-forget source release reported failure.
    ProxyReleaseFailed,
    /// A source's fetch failed or returned empty during a replenish attempt.
    SourceFailed,
    /// One source rejected a release broadcast.
    SourceReleaseFailed,
}

impl EventKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PoolInitialized => "pool.initialized",
            Self::PoolInitFailed => "pool.init.failed",
            Self::PoolReplenished => "pool.replenished",
            Self::PoolReplenishFailed => "pool.replenish.failed",
            Self::ProxyReleaseFailed => "proxy.release.failed",
            Self::SourceFailed => "source.failed",
            Self::SourceReleaseFailed => "source.release.failed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single emitted lifecycle event.
#[derive(Debug, Clone)]
pub struct PoolEvent {
    pub kind: EventKind,
    pub at: SystemTime,
    /// Source tag, present on source-scoped kinds.
    pub source: Option<String>,
    /// Error message, present on failure kinds.
    pub error: Option<String>,
}

impl PoolEvent {
    pub(crate) fn new(kind: EventKind) -> Self {
        Self {
            kind,
            at: SystemTime::now(),
            source: None,
            error: None,
        }
    }

    pub(crate) fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub(crate) fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

type Handler = Box<dyn Fn(&PoolEvent) + Send + Sync>;

struct Subscriber {
    filter: Option<EventKind>,
    handler: Handler,
}

/// Synchronous publish/subscribe bus for pool lifecycle events.
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one event kind.
    pub fn subscribe(&self, kind: EventKind, handler: impl Fn(&PoolEvent) + Send + Sync + 'static) {
        self.subscribers.write().push(Subscriber {
            filter: Some(kind),
            handler: Box::new(handler),
        });
    }

    /// Register a wildcard handler receiving every event.
    pub fn subscribe_all(&self, handler: impl Fn(&PoolEvent) + Send + Sync + 'static) {
        self.subscribers.write().push(Subscriber {
            filter: None,
            handler: Box::new(handler),
        });
    }

    pub(crate) fn emit(&self, event: PoolEvent) {
        let subscribers = self.subscribers.read();
        for subscriber in subscribers.iter() {
            if subscriber.filter.is_none() || subscriber.filter == Some(event.kind) {
                (subscriber.handler)(&event);
            }
        }
    }
}
