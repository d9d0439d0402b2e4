//! Provider adapters.
//!
//! This module contains:
//! - The `MarketProvider` and `NewsProvider` traits every adapter implements
//! - Shared response classification (status → failure kind, field parsing)
//! - Concrete adapters: Binance, Bybit and CoinCap for market data; an HTML
//!   front-page scraper and an RSS reader for news
//!
//! # Contract
//!
//! An adapter issues exactly one upstream request per call and never retries.
//! Every transport error, unexpected status, or shape mismatch comes back as a
//! [`ProviderFailure`](crate::models::ProviderFailure); adapters never panic
//! on upstream data.

mod response;
mod traits;

pub mod market;
pub mod news;

pub use traits::{MarketProvider, NewsProvider};
