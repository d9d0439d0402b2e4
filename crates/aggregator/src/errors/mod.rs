//! Error types and retry classification for the aggregation engine.
//!
//! This module provides:
//! - [`EngineError`]: request-level errors returned to the caller
//! - [`FailureKind`]: why a single provider failed (always folded into the aggregate)
//! - [`RetryClass`]: classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that fail a whole request.
///
/// Provider-level problems never show up here; they are reported as
/// [`ProviderFailure`](crate::models::ProviderFailure) entries inside the
/// aggregate instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The caller's input was malformed. Aggregation never starts.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The engine could not be assembled from its configuration
    /// (bad environment values, duplicate provider ids, client build failure).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An unexpected defect inside the engine itself.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Reason a single provider call ended in failure.
///
/// Each variant is classified into a [`RetryClass`] via
/// [`retry_class`](Self::retry_class), which the coordinator consults when
/// retries are enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Connection error, non-2xx status, or upstream-reported error.
    Unavailable,

    /// The provider throttled the request (HTTP 429 / 418).
    RateLimited,

    /// The transport timed out or the request deadline elapsed.
    Timeout,

    /// The provider answered, but not in the shape we expect.
    MalformedResponse,
}

impl FailureKind {
    /// Returns the retry classification for this failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptointel_aggregator::errors::{FailureKind, RetryClass};
    ///
    /// assert_eq!(FailureKind::Timeout.retry_class(), RetryClass::Transient);
    /// assert_eq!(FailureKind::MalformedResponse.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Unavailable | Self::Timeout => RetryClass::Transient,
            Self::RateLimited | Self::MalformedResponse => RetryClass::Never,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "UNAVAILABLE",
            Self::RateLimited => "RATE_LIMITED",
            Self::Timeout => "TIMEOUT",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
