//! Market-data exchange adapters.
//!
//! Each adapter fetches a 24h ticker for one trading pair and maps it to a
//! [`MarketRecord`](crate::models::MarketRecord). Declaration order here is the
//! order records appear in every `MarketSummary`.

mod binance;
mod bybit;
mod coincap;

pub use binance::BinanceProvider;
pub use bybit::BybitProvider;
pub use coincap::CoinCapProvider;
