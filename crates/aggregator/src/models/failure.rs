use serde::{Deserialize, Serialize};

use super::types::ProviderId;
use crate::errors::FailureKind;

/// Why one provider is missing from an aggregate.
///
/// Never surfaced as a request error; always carried in the aggregate's
/// `failures` list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: ProviderId,
    pub reason: FailureKind,
    pub detail: String,
}

impl ProviderFailure {
    pub fn new(
        provider: impl Into<ProviderId>,
        reason: FailureKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            reason,
            detail: detail.into(),
        }
    }

    pub fn unavailable(provider: impl Into<ProviderId>, detail: impl Into<String>) -> Self {
        Self::new(provider, FailureKind::Unavailable, detail)
    }

    pub fn malformed(provider: impl Into<ProviderId>, detail: impl Into<String>) -> Self {
        Self::new(provider, FailureKind::MalformedResponse, detail)
    }

    pub fn timeout(provider: impl Into<ProviderId>, detail: impl Into<String>) -> Self {
        Self::new(provider, FailureKind::Timeout, detail)
    }
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed ({}): {}", self.provider, self.reason, self.detail)
    }
}
