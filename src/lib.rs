//! # rotating-proxy-pool
//!
//! An always-ready pool of authenticated HTTP/SOCKS5 proxies for reqwest.
//!
//! The pool draws proxies from an ordered list of provider sources, serves
//! acquisitions without blocking on provider APIs, refills itself in the
//! background when consumption approaches a low-water mark, and fails over
//! across providers when one is degraded or exhausted. Lifecycle events
//! (initialization, replenishment, source failures) are published on a
//! subscriber bus.

pub mod config;
pub mod error;
pub mod events;
pub mod middleware;
pub mod pool;
pub mod proxy;
pub mod router;
pub mod source;
pub mod sources;
pub mod validator;
mod utils;

pub use config::{PoolConfig, PoolConfigBuilder};
pub use error::{ConfigError, EndpointParseError, PoolError, ReplenishError, SourceError};
pub use events::{EventBus, EventKind, PoolEvent};
pub use middleware::ProxyPoolMiddleware;
pub use pool::{PoolStats, PoolStatus, ProxyItemStatus, ProxyPool};
pub use proxy::{Classification, Protocol, ProxyConnection, ProxyEndpoint, ProxyItem};
pub use router::SourceRouter;
pub use source::{Capabilities, ProxySource, SourceHealth};
pub use validator::{StubValidator, Validator};
