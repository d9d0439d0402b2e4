//! Normalization schema
//!
//! Provider-agnostic shapes every adapter produces and the coordinator
//! assembles:
//! - `types` - Type aliases for common identifiers (ProviderId)
//! - `market` - Market query, per-provider record and the aggregate summary
//! - `news` - Headlines, per-publisher feeds and the aggregate digest
//! - `failure` - Structured provider failures folded into every aggregate

mod failure;
mod market;
mod news;
mod types;

pub use failure::ProviderFailure;
pub use market::{MarketQuery, MarketRecord, MarketSummary, MAX_SYMBOL_LEN};
pub use news::{
    Headline, NewsDigest, NewsFeed, DEFAULT_PER_PUBLISHER_LIMIT, MAX_PER_PUBLISHER_LIMIT,
};
pub use types::ProviderId;
