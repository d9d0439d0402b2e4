//! Ordered provider sets and their fan-out.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::{FanOut, ProviderCall};
use crate::config::MarketEndpoints;
use crate::errors::EngineError;
use crate::models::{MarketQuery, MarketRecord, NewsFeed, ProviderFailure, ProviderId};
use crate::provider::market::{BinanceProvider, BybitProvider, CoinCapProvider};
use crate::provider::news::{FeedFormat, HtmlNewsProvider, RssNewsProvider, DEFAULT_TARGETS};
use crate::provider::{MarketProvider, NewsProvider};
use crate::transport::HttpTransport;

/// The adapters one engine fans out to.
///
/// Declaration order is significant: it is the order of records, feeds and
/// failures in every aggregate.
pub struct ProviderRegistry {
    market: Vec<Arc<dyn MarketProvider>>,
    news: Vec<Arc<dyn NewsProvider>>,
}

impl ProviderRegistry {
    /// Create a registry, rejecting duplicate identifiers within either set.
    pub fn new(
        market: Vec<Arc<dyn MarketProvider>>,
        news: Vec<Arc<dyn NewsProvider>>,
    ) -> Result<Self, EngineError> {
        ensure_unique("market provider", market.iter().map(|p| p.id()))?;
        ensure_unique("news publisher", news.iter().map(|p| p.id()))?;
        Ok(Self { market, news })
    }

    /// Binance, Bybit and CoinCap plus every default news target, all sharing
    /// one transport.
    pub fn with_defaults(
        transport: Arc<dyn HttpTransport>,
        endpoints: &MarketEndpoints,
    ) -> Result<Self, EngineError> {
        let market: Vec<Arc<dyn MarketProvider>> = vec![
            Arc::new(BinanceProvider::new(
                transport.clone(),
                endpoints.binance_base_url.as_str(),
            )),
            Arc::new(BybitProvider::new(
                transport.clone(),
                endpoints.bybit_base_url.as_str(),
            )),
            Arc::new(CoinCapProvider::new(
                transport.clone(),
                endpoints.coincap_base_url.as_str(),
                endpoints.coincap_api_key.clone(),
            )),
        ];

        let mut news: Vec<Arc<dyn NewsProvider>> = Vec::with_capacity(DEFAULT_TARGETS.len());
        for target in DEFAULT_TARGETS {
            let provider: Arc<dyn NewsProvider> = match target.format {
                FeedFormat::Html => Arc::new(HtmlNewsProvider::new(transport.clone(), target)?),
                FeedFormat::Rss => Arc::new(RssNewsProvider::new(transport.clone(), target)),
            };
            news.push(provider);
        }

        info!(
            "Registered {} market providers and {} news publishers",
            market.len(),
            news.len()
        );
        Self::new(market, news)
    }

    pub fn market_ids(&self) -> Vec<ProviderId> {
        self.market.iter().map(|p| p.id()).collect()
    }

    pub fn news_ids(&self) -> Vec<ProviderId> {
        self.news.iter().map(|p| p.id()).collect()
    }

    /// Query every market provider once, concurrently.
    ///
    /// Each provider ends up in exactly one of the two returned lists.
    pub async fn fetch_markets(
        &self,
        query: &MarketQuery,
        fan_out: &FanOut,
    ) -> (Vec<MarketRecord>, Vec<ProviderFailure>) {
        let calls: Vec<_> = self
            .market
            .iter()
            .map(|provider| ProviderCall::new(provider.id(), move || provider.fetch_market(query)))
            .collect();

        let deadline = fan_out.policy().deadline;
        let mut records = Vec::new();
        let mut failures = Vec::new();
        for outcome in fan_out.run(calls).await {
            debug!(
                "{} finished in {:?} after {} attempt(s)",
                outcome.provider, outcome.elapsed, outcome.attempts
            );
            match outcome.into_result(deadline) {
                Ok(record) => records.push(record),
                Err(failure) => failures.push(failure),
            }
        }
        (records, failures)
    }

    /// Read every news publisher once, concurrently, keeping at most `limit`
    /// headlines per publisher.
    pub async fn fetch_news(
        &self,
        limit: usize,
        fan_out: &FanOut,
    ) -> (Vec<NewsFeed>, Vec<ProviderFailure>) {
        let calls: Vec<_> = self
            .news
            .iter()
            .map(|provider| ProviderCall::new(provider.id(), move || provider.fetch_headlines(limit)))
            .collect();

        let deadline = fan_out.policy().deadline;
        let mut feeds = Vec::new();
        let mut failures = Vec::new();
        for outcome in fan_out.run(calls).await {
            let publisher = outcome.provider.clone();
            match outcome.into_result(deadline) {
                Ok(mut headlines) => {
                    headlines.truncate(limit);
                    feeds.push(NewsFeed {
                        publisher,
                        headlines,
                    });
                }
                Err(failure) => failures.push(failure),
            }
        }
        (feeds, failures)
    }
}

fn ensure_unique(
    kind: &str,
    ids: impl Iterator<Item = ProviderId>,
) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.clone()) {
            return Err(EngineError::Configuration(format!(
                "Duplicate {} id '{}'",
                kind, id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchPolicy;
    use crate::errors::FailureKind;
    use crate::models::Headline;
    use crate::transport::stub::StubTransport;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct MockMarket {
        id: &'static str,
        should_fail: bool,
        call_count: AtomicUsize,
    }

    impl MockMarket {
        fn new(id: &'static str, should_fail: bool) -> Self {
            Self {
                id,
                should_fail,
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketProvider for MockMarket {
        fn id(&self) -> ProviderId {
            self.id.into()
        }

        async fn fetch_market(&self, query: &MarketQuery) -> Result<MarketRecord, ProviderFailure> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                return Err(ProviderFailure::unavailable(self.id, "Mock failure"));
            }
            Ok(MarketRecord {
                provider: self.id.into(),
                symbol: query.pair(),
                price: dec!(100),
                change_24h: dec!(1.5),
                volume_24h: dec!(1000),
                as_of: Utc::now(),
            })
        }
    }

    struct MockNews {
        id: &'static str,
        available: usize,
    }

    #[async_trait]
    impl NewsProvider for MockNews {
        fn id(&self) -> ProviderId {
            self.id.into()
        }

        // Ignores the limit hint on purpose
        async fn fetch_headlines(&self, _limit: usize) -> Result<Vec<Headline>, ProviderFailure> {
            Ok((0..self.available)
                .map(|i| Headline {
                    publisher: self.id.into(),
                    title: format!("Headline {}", i),
                    url: format!("https://{}.example/{}", self.id, i),
                    published_at: None,
                    summary: None,
                })
                .collect())
        }
    }

    fn fan_out() -> FanOut {
        FanOut::new(FetchPolicy {
            deadline: Duration::from_secs(5),
            ..FetchPolicy::default()
        })
    }

    #[test]
    fn test_rejects_duplicate_market_ids() {
        let market: Vec<Arc<dyn MarketProvider>> = vec![
            Arc::new(MockMarket::new("binance", false)),
            Arc::new(MockMarket::new("binance", false)),
        ];
        let result = ProviderRegistry::new(market, Vec::new());
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_defaults_cover_all_sources() {
        let registry =
            ProviderRegistry::with_defaults(Arc::new(StubTransport::new()), &MarketEndpoints::default())
                .unwrap();
        assert_eq!(registry.market_ids(), vec!["binance", "bybit", "coincap"]);

        let news = registry.news_ids();
        assert_eq!(news.len(), 11);
        assert_eq!(news[0], "CoinDesk");
        assert_eq!(news[10], "CryptoPanic");
    }

    #[tokio::test]
    async fn test_fetch_markets_splits_records_and_failures() {
        let market: Vec<Arc<dyn MarketProvider>> = vec![
            Arc::new(MockMarket::new("a", false)),
            Arc::new(MockMarket::new("b", true)),
            Arc::new(MockMarket::new("c", false)),
        ];
        let registry = ProviderRegistry::new(market, Vec::new()).unwrap();
        let query = MarketQuery::new("BTC", "USDT").unwrap();

        let (records, failures) = registry.fetch_markets(&query, &fan_out()).await;

        let ok: Vec<_> = records.iter().map(|r| r.provider.as_ref()).collect();
        assert_eq!(ok, vec!["a", "c"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].provider, "b");
        assert_eq!(failures[0].reason, FailureKind::Unavailable);
    }

    #[tokio::test]
    async fn test_each_provider_called_once() {
        let provider = Arc::new(MockMarket::new("only", false));
        let as_dyn: Arc<dyn MarketProvider> = provider.clone();
        let registry = ProviderRegistry::new(vec![as_dyn], Vec::new()).unwrap();
        let query = MarketQuery::new("ETH", "USDT").unwrap();

        registry.fetch_markets(&query, &fan_out()).await;
        assert_eq!(provider.call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_news_truncates_per_publisher() {
        let news: Vec<Arc<dyn NewsProvider>> = vec![
            Arc::new(MockNews {
                id: "Busy",
                available: 20,
            }),
            Arc::new(MockNews {
                id: "Quiet",
                available: 2,
            }),
        ];
        let registry = ProviderRegistry::new(Vec::new(), news).unwrap();

        let (feeds, failures) = registry.fetch_news(6, &fan_out()).await;
        assert!(failures.is_empty());
        assert_eq!(feeds[0].publisher, "Busy");
        assert_eq!(feeds[0].headlines.len(), 6);
        assert_eq!(feeds[1].headlines.len(), 2);
    }
}
