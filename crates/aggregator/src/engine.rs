//! The aggregation engine: the two public operations and the transport
//! lifecycle behind them.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::{EngineConfig, FetchPolicy};
use crate::errors::EngineError;
use crate::models::{
    MarketQuery, MarketSummary, NewsDigest, DEFAULT_PER_PUBLISHER_LIMIT, MAX_PER_PUBLISHER_LIMIT,
};
use crate::registry::{FanOut, ProviderRegistry};
use crate::transport::{HttpClient, HttpTransport};

/// Fans requests out over the fixed provider registry.
///
/// Owns the shared transport; call [`shutdown`](Self::shutdown) once when the
/// process is done with the engine.
pub struct AggregationEngine {
    registry: ProviderRegistry,
    fan_out: FanOut,
    transport: Arc<dyn HttpTransport>,
}

impl AggregationEngine {
    /// Build the pooled HTTP client and the default provider registry.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let transport: Arc<dyn HttpTransport> = Arc::new(HttpClient::new(&config.transport)?);
        let registry = ProviderRegistry::with_defaults(transport.clone(), &config.endpoints)?;
        info!(
            "Aggregation engine ready (deadline {:?}, retries {})",
            config.policy.deadline, config.policy.retries
        );
        Ok(Self::with_registry(transport, registry, config.policy))
    }

    /// Build an engine from the process environment.
    pub fn from_env() -> Result<Self, EngineError> {
        Self::new(EngineConfig::from_env()?)
    }

    /// Assemble an engine from parts, e.g. a stub transport in tests.
    pub fn with_registry(
        transport: Arc<dyn HttpTransport>,
        registry: ProviderRegistry,
        policy: FetchPolicy,
    ) -> Self {
        Self {
            registry,
            fan_out: FanOut::new(policy),
            transport,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Current 24h market view for `base`/`quote` across every exchange.
    ///
    /// Fails only on invalid symbols, before any provider is contacted.
    /// Provider problems are reported in `MarketSummary::failures`.
    pub async fn get_market_summary(
        &self,
        base: &str,
        quote: &str,
    ) -> Result<MarketSummary, EngineError> {
        let query = MarketQuery::new(base, quote)?;
        let (records, failures) = self.registry.fetch_markets(&query, &self.fan_out).await;

        if records.is_empty() {
            warn!("No market provider answered for {}", query.pair());
        }
        info!(
            "Market summary for {}: {} records, {} failures",
            query.pair(),
            records.len(),
            failures.len()
        );

        Ok(MarketSummary {
            symbol: query.pair(),
            query,
            timestamp: Utc::now(),
            records,
            failures,
        })
    }

    /// Latest headlines from every publisher, at most `per_publisher_limit`
    /// each (default 6, clamped to 50).
    pub async fn get_news_digest(
        &self,
        per_publisher_limit: Option<i64>,
    ) -> Result<NewsDigest, EngineError> {
        let limit = resolve_news_limit(per_publisher_limit)?;
        let (feeds, failures) = self.registry.fetch_news(limit, &self.fan_out).await;

        let digest = NewsDigest {
            per_publisher_limit: limit,
            fetched_at: Utc::now(),
            feeds,
            failures,
        };
        info!(
            "News digest: {} headlines from {} publishers, {} failures",
            digest.total_headlines(),
            digest.feeds.len(),
            digest.failures.len()
        );
        Ok(digest)
    }

    /// Release the shared transport. In-flight requests drain first; later
    /// requests fail their providers as unavailable.
    pub async fn shutdown(&self) {
        info!("Shutting down aggregation engine");
        self.transport.shutdown().await;
    }
}

/// Map the caller's limit to an effective per-publisher limit.
pub fn resolve_news_limit(requested: Option<i64>) -> Result<usize, EngineError> {
    match requested {
        None => Ok(DEFAULT_PER_PUBLISHER_LIMIT),
        Some(n) if n < 1 => Err(EngineError::InvalidRequest(format!(
            "per_publisher_limit must be a positive integer, got {}",
            n
        ))),
        Some(n) => Ok(usize::try_from(n)
            .unwrap_or(MAX_PER_PUBLISHER_LIMIT)
            .min(MAX_PER_PUBLISHER_LIMIT)),
    }
}
