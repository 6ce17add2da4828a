//! Error types for the rotating-proxy-pool crate.

use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Errors surfaced by pool operations.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Operation called before `init()` succeeded.
    #[error("[pool] not initialized")]
    NotInitialized,
    /// Pool is empty or every item is already committed to a caller.
    #[error("[pool] exhausted: no unused proxy available")]
    Exhausted,
    /// Initialization failed. Retryable by calling `init()` again.
    #[error("[pool] initialization failed: {0}")]
    Init(#[source] ReplenishError),
}

/// Error from an individual source operation, tagged with the source name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("[source:{source_name}] fetch failed: {message}")]
    Fetch {
        source_name: String,
        message: String,
    },
    #[error("[source:{source_name}] release failed: {message}")]
    Release {
        source_name: String,
        message: String,
    },
}

impl SourceError {
    pub fn fetch(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            source_name: source.into(),
            message: message.into(),
        }
    }

    pub fn release(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Release {
            source_name: source.into(),
            message: message.into(),
        }
    }

    /// Name tag of the source that produced this error.
    pub fn source_name(&self) -> &str {
        match self {
            Self::Fetch { source_name, .. } | Self::Release { source_name, .. } => source_name,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Fetch { message, .. } | Self::Release { message, .. } => message,
        }
    }
}

/// Every configured source failed or returned an empty batch during a
/// replenish cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplenishError {
    attempts: Vec<SourceError>,
}

impl ReplenishError {
    pub(crate) fn new(attempts: Vec<SourceError>) -> Self {
        Self { attempts }
    }

    /// Per-source failures in the order the sources were tried.
    pub fn attempts(&self) -> &[SourceError] {
        &self.attempts
    }
}

impl Display for ReplenishError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.attempts.is_empty() {
            return write!(f, "[source] all sources exhausted: no sources configured");
        }
        let detail = self
            .attempts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(
            f,
            "[source] all sources exhausted after {} attempt(s): {}",
            self.attempts.len(),
            detail
        )
    }
}

impl std::error::Error for ReplenishError {}

/// Rejected pool configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("pool_size must be greater than 0")]
    ZeroPoolSize,
    #[error("low_water_fraction must be within (0, 1): {value}")]
    InvalidLowWater { value: f64 },
    #[error("at least one proxy source is required")]
    NoSources,
}

/// Rejected proxy endpoint text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EndpointParseError {
    #[error("empty proxy endpoint")]
    Empty,
    #[error("invalid port '{value}'")]
    InvalidPort { value: String },
    #[error("unsupported proxy scheme '{value}'")]
    UnsupportedScheme { value: String },
    #[error("invalid proxy url '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },
    #[error("unrecognized proxy format '{value}'")]
    Unrecognized { value: String },
}
