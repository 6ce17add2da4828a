//! Connection validation seam, reserved for active health checks.

use async_trait::async_trait;

use crate::proxy::ProxyConnection;

/// Pluggable check applied to a connection on demand.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, connection: &ProxyConnection) -> bool;
}

/// Default validator: performs no check and reports every connection invalid.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubValidator;

#[async_trait]
impl Validator for StubValidator {
    async fn validate(&self, _connection: &ProxyConnection) -> bool {
        false
    }
}
