//! Adapter trait definitions.

use async_trait::async_trait;

use crate::models::{Headline, MarketQuery, MarketRecord, ProviderFailure, ProviderId};

/// Adapter for one market-data exchange.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use cryptointel_aggregator::provider::MarketProvider;
///
/// struct MyExchange;
///
/// #[async_trait]
/// impl MarketProvider for MyExchange {
///     fn id(&self) -> ProviderId {
///         "my_exchange".into()
///     }
///
///     async fn fetch_market(&self, query: &MarketQuery) -> Result<MarketRecord, ProviderFailure> {
///         // one request, map the payload, or fail
///     }
/// }
/// ```
#[async_trait]
pub trait MarketProvider: Send + Sync {
    /// Unique identifier, used as `MarketRecord::provider` and in failures.
    fn id(&self) -> ProviderId;

    /// Fetch and normalize the 24h ticker for `query`.
    async fn fetch_market(&self, query: &MarketQuery) -> Result<MarketRecord, ProviderFailure>;
}

/// Adapter for one news publisher or feed.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    /// Publisher name, used as `Headline::publisher` and in failures.
    fn id(&self) -> ProviderId;

    /// Fetch the publisher's latest headlines in source order.
    ///
    /// `limit` is a hint: adapters may stop parsing once they have that many.
    /// Returning fewer is a success.
    async fn fetch_headlines(&self, limit: usize) -> Result<Vec<Headline>, ProviderFailure>;
}
