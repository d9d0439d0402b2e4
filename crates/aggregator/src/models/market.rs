use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::failure::ProviderFailure;
use super::types::ProviderId;
use crate::errors::EngineError;

/// Longest accepted symbol token.
pub const MAX_SYMBOL_LEN: usize = 10;

/// Validated trading pair request.
///
/// Symbols are case-insensitive on input and stored uppercased.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketQuery {
    pub base: String,
    pub quote: String,
}

impl MarketQuery {
    /// Build a query, rejecting empty or non-alphanumeric symbols.
    pub fn new(base: &str, quote: &str) -> Result<Self, EngineError> {
        Ok(Self {
            base: normalize_symbol("base", base)?,
            quote: normalize_symbol("quote", quote)?,
        })
    }

    /// Concatenated exchange symbol, e.g. `BTCUSDT`.
    pub fn pair(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

fn normalize_symbol(field: &str, raw: &str) -> Result<String, EngineError> {
    if raw.is_empty() {
        return Err(EngineError::InvalidRequest(format!(
            "{} symbol is required",
            field
        )));
    }
    if raw.len() > MAX_SYMBOL_LEN || !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(EngineError::InvalidRequest(format!(
            "{} symbol '{}' must be 1-{} alphanumeric characters",
            field, raw, MAX_SYMBOL_LEN
        )));
    }
    Ok(raw.to_ascii_uppercase())
}

/// One provider's normalized 24h ticker snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketRecord {
    /// Provider that produced the record (binance, bybit, coincap)
    pub provider: ProviderId,

    /// Symbol as requested from the provider (e.g. BTCUSDT)
    pub symbol: String,

    /// Last traded price
    pub price: Decimal,

    /// 24 hour price change, in percent
    pub change_24h: Decimal,

    /// 24 hour traded volume in quote currency
    pub volume_24h: Decimal,

    /// Upstream timestamp of the snapshot, or fetch time when the upstream has none
    pub as_of: DateTime<Utc>,
}

/// Aggregated market view for one pair across every market provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarketSummary {
    pub query: MarketQuery,

    /// Concatenated symbol built from base+quote
    pub symbol: String,

    /// UTC time the snapshot was assembled
    pub timestamp: DateTime<Utc>,

    /// Successful records in provider declaration order
    pub records: Vec<MarketRecord>,

    /// Providers that did not produce a record, in declaration order
    pub failures: Vec<ProviderFailure>,
}

impl MarketSummary {
    /// Median price across all successful records.
    ///
    /// Even counts average the two middle prices; `None` when no provider
    /// succeeded.
    pub fn median_price(&self) -> Option<Decimal> {
        let mut prices: Vec<Decimal> = self.records.iter().map(|r| r.price).collect();
        if prices.is_empty() {
            return None;
        }
        prices.sort();
        let mid = prices.len() / 2;
        if prices.len() % 2 == 0 {
            let (lo, hi) = (prices[mid - 1], prices[mid]);
            // Near Decimal::MAX the sum overflows; the midpoint of the gap does not
            lo.checked_add(hi)
                .map(|sum| sum / Decimal::TWO)
                .or_else(|| hi.checked_sub(lo).map(|gap| lo + gap / Decimal::TWO))
        } else {
            Some(prices[mid])
        }
    }

    /// Record reported by the given provider, if it succeeded.
    pub fn record(&self, provider: &str) -> Option<&MarketRecord> {
        self.records.iter().find(|r| r.provider == provider)
    }

    /// Failure reported for the given provider, if it failed.
    pub fn failure(&self, provider: &str) -> Option<&ProviderFailure> {
        self.failures.iter().find(|f| f.provider == provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(provider: &'static str, price: Decimal) -> MarketRecord {
        MarketRecord {
            provider: provider.into(),
            symbol: "BTCUSDT".to_string(),
            price,
            change_24h: dec!(0),
            volume_24h: dec!(0),
            as_of: Utc::now(),
        }
    }

    fn summary(records: Vec<MarketRecord>) -> MarketSummary {
        MarketSummary {
            query: MarketQuery::new("BTC", "USDT").unwrap(),
            symbol: "BTCUSDT".to_string(),
            timestamp: Utc::now(),
            records,
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_query_uppercases_symbols() {
        let query = MarketQuery::new("btc", "usdt").unwrap();
        assert_eq!(query.base, "BTC");
        assert_eq!(query.quote, "USDT");
        assert_eq!(query.pair(), "BTCUSDT");
    }

    #[test]
    fn test_query_rejects_empty_base() {
        let err = MarketQuery::new("", "USDT").unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
    }

    #[test]
    fn test_query_rejects_empty_quote() {
        let err = MarketQuery::new("BTC", "").unwrap_err();
        assert!(matches!(err, EngineError::InvalidRequest(_)));
    }

    #[test]
    fn test_query_rejects_non_alphanumeric() {
        assert!(MarketQuery::new("BTC-1", "USDT").is_err());
        assert!(MarketQuery::new("BTC", "US DT").is_err());
        assert!(MarketQuery::new("ÄBC", "USDT").is_err());
    }

    #[test]
    fn test_query_length_bounds() {
        assert!(MarketQuery::new("A", "USDT").is_ok());
        assert!(MarketQuery::new("ABCDEFGHIJ", "USDT").is_ok());
        assert!(MarketQuery::new("ABCDEFGHIJK", "USDT").is_err());
    }

    #[test]
    fn test_median_price_odd() {
        let s = summary(vec![
            record("a", dec!(64000.12)),
            record("b", dec!(63950.55)),
            record("c", dec!(63975.10)),
        ]);
        assert_eq!(s.median_price(), Some(dec!(63975.10)));
    }

    #[test]
    fn test_median_price_even() {
        let s = summary(vec![record("a", dec!(100)), record("b", dec!(101))]);
        assert_eq!(s.median_price(), Some(dec!(100.5)));
    }

    #[test]
    fn test_median_price_empty() {
        assert_eq!(summary(Vec::new()).median_price(), None);
    }

    #[test]
    fn test_median_price_even_near_max() {
        let s = summary(vec![record("a", Decimal::MAX), record("b", Decimal::MAX)]);
        assert_eq!(s.median_price(), Some(Decimal::MAX));

        let s = summary(vec![
            record("a", Decimal::MAX - dec!(2)),
            record("b", Decimal::MAX),
        ]);
        assert_eq!(s.median_price(), Some(Decimal::MAX - dec!(1)));
    }

    #[test]
    fn test_record_lookup() {
        let s = summary(vec![record("binance", dec!(1))]);
        assert!(s.record("binance").is_some());
        assert!(s.record("bybit").is_none());
        assert!(s.failure("binance").is_none());
    }
}
