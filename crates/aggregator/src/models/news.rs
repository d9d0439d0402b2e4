use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::failure::ProviderFailure;
use super::types::ProviderId;

/// Headlines per publisher when the caller does not ask for a specific count.
pub const DEFAULT_PER_PUBLISHER_LIMIT: usize = 6;

/// Larger requested limits are clamped to this value.
pub const MAX_PER_PUBLISHER_LIMIT: usize = 50;

/// One normalized news item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    /// Publisher name
    pub publisher: ProviderId,

    /// Article headline
    pub title: String,

    /// Absolute article URL
    pub url: String,

    /// Publication timestamp in UTC, when the source exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,

    /// Short teaser or dek
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Headlines from one publisher, in source order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsFeed {
    pub publisher: ProviderId,
    pub headlines: Vec<Headline>,
}

/// Aggregated headlines across every news provider.
///
/// `feeds` is the publisher → headlines mapping, kept as a sequence so the
/// declared publisher order survives serialization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewsDigest {
    pub per_publisher_limit: usize,

    /// UTC timestamp of the aggregation
    pub fetched_at: DateTime<Utc>,

    pub feeds: Vec<NewsFeed>,

    pub failures: Vec<ProviderFailure>,
}

impl NewsDigest {
    /// Headlines for a publisher, `None` if it failed or is unknown.
    pub fn headlines(&self, publisher: &str) -> Option<&[Headline]> {
        self.feeds
            .iter()
            .find(|feed| feed.publisher == publisher)
            .map(|feed| feed.headlines.as_slice())
    }

    pub fn failure(&self, publisher: &str) -> Option<&ProviderFailure> {
        self.failures.iter().find(|f| f.provider == publisher)
    }

    /// Total number of headlines across all publishers.
    pub fn total_headlines(&self) -> usize {
        self.feeds.iter().map(|feed| feed.headlines.len()).sum()
    }
}
