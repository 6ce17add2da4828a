//! Configuration for the proxy pool.

use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::source::ProxySource;
use crate::validator::{StubValidator, Validator};

/// Configuration for the proxy pool.
#[derive(Clone)]
pub struct PoolConfig {
    /// Ordered provider list; the first source is primary, the rest are
    /// strict fallbacks.
    pub sources: Vec<Arc<dyn ProxySource>>,
    /// Target pool cardinality.
    pub pool_size: usize,
    /// Refill trips when the unused count is at or below
    /// `pool_size * low_water_fraction`.
    pub low_water_fraction: f64,
    /// Times the middleware retries a request with a different proxy.
    pub retry_count: usize,
    /// Maximum requests per second per proxy, enforced by the middleware.
    pub max_requests_per_second: f64,
    /// Timeout applied to requests sent through the middleware.
    pub request_timeout: Duration,
    /// Connection validator. The default stub reports every connection
    /// invalid; active checks are a future extension.
    pub validator: Arc<dyn Validator>,
}

impl PoolConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::ZeroPoolSize);
        }
        if !(self.low_water_fraction > 0.0 && self.low_water_fraction < 1.0) {
            return Err(ConfigError::InvalidLowWater {
                value: self.low_water_fraction,
            });
        }
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        Ok(())
    }
}

/// Builder for `PoolConfig`.
pub struct PoolConfigBuilder {
    sources: Vec<Arc<dyn ProxySource>>,
    pool_size: Option<usize>,
    low_water_fraction: Option<f64>,
    retry_count: Option<usize>,
    max_requests_per_second: Option<f64>,
    request_timeout: Option<Duration>,
    validator: Option<Arc<dyn Validator>>,
}

impl PoolConfigBuilder {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            pool_size: None,
            low_water_fraction: None,
            retry_count: None,
            max_requests_per_second: None,
            request_timeout: None,
            validator: None,
        }
    }

    /// Set the ordered provider list.
    pub fn sources(mut self, sources: Vec<Arc<dyn ProxySource>>) -> Self {
        self.sources = sources;
        self
    }

    /// Append one provider to the list.
    pub fn source(mut self, source: Arc<dyn ProxySource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Set the target pool cardinality.
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = Some(size);
        self
    }

    /// Set the unused-count fraction below which a refill is scheduled.
    pub fn low_water_fraction(mut self, fraction: f64) -> Self {
        self.low_water_fraction = Some(fraction);
        self
    }

    /// Set the number of times to retry a request with different proxies.
    pub fn retry_count(mut self, count: usize) -> Self {
        self.retry_count = Some(count);
        self
    }

    /// Set the maximum requests per second per proxy.
    pub fn max_requests_per_second(mut self, rps: f64) -> Self {
        self.max_requests_per_second = Some(rps);
        self
    }

    /// Set the timeout for requests sent through the middleware.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Inject a connection validator.
    pub fn validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> PoolConfig {
        PoolConfig {
            sources: self.sources,
            pool_size: self.pool_size.unwrap_or(20),
            low_water_fraction: self.low_water_fraction.unwrap_or(0.3),
            retry_count: self.retry_count.unwrap_or(3),
            max_requests_per_second: self.max_requests_per_second.unwrap_or(5.0),
            request_timeout: self.request_timeout.unwrap_or(Duration::from_secs(30)),
            validator: self
                .validator
                .unwrap_or_else(|| Arc::new(StubValidator)),
        }
    }
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{Protocol, ProxyEndpoint};
    use crate::sources::StaticListSource;

    fn one_source() -> Arc<dyn crate::source::ProxySource> {
        Arc::new(StaticListSource::new(
            "local",
            vec![ProxyEndpoint::new("127.0.0.1", 1080, Protocol::Socks5)],
        ))
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = PoolConfig::builder().source(one_source()).build();
        assert_eq!(config.pool_size, 20);
        assert!((config.low_water_fraction - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.retry_count, 3);
    }

    #[test]
    fn validate_rejects_zero_pool_size() {
        let config = PoolConfig::builder().source(one_source()).pool_size(0).build();
        assert!(matches!(config.validate(), Err(ConfigError::ZeroPoolSize)));
    }

    #[test]
    fn validate_rejects_out_of_range_low_water() {
        let config = PoolConfig::builder()
            .source(one_source())
            .low_water_fraction(1.5)
            .build();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLowWater { .. })
        ));
    }

    #[test]
    fn validate_rejects_an_empty_source_list() {
        let config = PoolConfig::builder().build();
        assert!(matches!(config.validate(), Err(ConfigError::NoSources)));
    }
}
