//! Cryptointel Aggregation Engine
//!
//! Fans one logical request out to every registered upstream provider
//! concurrently, normalizes each answer into a shared schema and merges the
//! results into a single aggregate. Partial upstream failure never fails the
//! request: every provider lands either in the aggregate's data or in its
//! `failures` list.
//!
//! # Overview
//!
//! - Market data: Binance, Bybit and CoinCap 24h tickers for a trading pair
//! - News: ten scraped publisher front pages plus the CryptoPanic RSS feed
//! - One global deadline per request; late providers are reported as timeouts
//! - Output order follows provider declaration order, never completion order
//!
//! # Architecture
//!
//! ```text
//! +--------------------+
//! | AggregationEngine  |  (validation, aggregate assembly)
//! +--------------------+
//!           |
//!           v
//! +--------------------+
//! | ProviderRegistry   |  (fixed adapter set)
//! |   + FanOut         |  (concurrent calls, deadline, retries)
//! +--------------------+
//!           |
//!           v
//! +--------------------+
//! | Provider adapters  |  (binance, bybit, coincap, html, rss)
//! +--------------------+
//!           |
//!           v
//! +--------------------+
//! | HttpTransport      |  (pooled reqwest client)
//! +--------------------+
//! ```
//!
//! # Core Types
//!
//! - [`MarketSummary`] / [`MarketRecord`] - aggregated and per-exchange market data
//! - [`NewsDigest`] / [`Headline`] - aggregated and per-item news
//! - [`ProviderFailure`] - why a provider is missing from an aggregate
//! - [`EngineError`] - request-level errors

pub mod config;
pub mod engine;
pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod transport;

pub use config::{EngineConfig, FetchPolicy, MarketEndpoints, TransportConfig};
pub use engine::AggregationEngine;
pub use errors::{EngineError, FailureKind, RetryClass};
pub use models::{
    Headline, MarketQuery, MarketRecord, MarketSummary, NewsDigest, NewsFeed, ProviderFailure,
    ProviderId,
};
pub use provider::{MarketProvider, NewsProvider};
pub use registry::{FanOut, ProviderRegistry};
pub use transport::{HttpClient, HttpRequest, HttpResponse, HttpTransport, TransportError};
