//! Bybit spot market adapter.
//!
//! `GET /v5/market/tickers?category=spot&symbol=BTCUSDT`. Bybit wraps every
//! answer in a `retCode`/`retMsg` envelope and reports errors with HTTP 200,
//! so the envelope is checked before the ticker list.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{MarketQuery, MarketRecord, ProviderFailure, ProviderId};
use crate::provider::response::{decimal_field, fetch_text, millis_field, parse_json};
use crate::provider::MarketProvider;
use crate::transport::{HttpRequest, HttpTransport};

const PROVIDER_ID: &str = "bybit";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TickersResponse {
    #[serde(default)]
    ret_code: i64,
    #[serde(default)]
    ret_msg: String,
    #[serde(default)]
    result: Option<TickersResult>,
    /// Server time (epoch ms)
    time: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TickersResult {
    #[serde(default)]
    list: Vec<Value>,
}

pub struct BybitProvider {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl BybitProvider {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MarketProvider for BybitProvider {
    fn id(&self) -> ProviderId {
        PROVIDER_ID.into()
    }

    async fn fetch_market(&self, query: &MarketQuery) -> Result<MarketRecord, ProviderFailure> {
        let id = self.id();
        let symbol = query.pair();
        debug!("Fetching spot ticker for {} from Bybit", symbol);

        let request = HttpRequest::get(format!("{}/v5/market/tickers", self.base_url))
            .query("category", "spot")
            .query("symbol", symbol.as_str());
        let body = fetch_text(self.transport.as_ref(), &id, request).await?;
        let response: TickersResponse = parse_json(&id, &body)?;

        if response.ret_code != 0 {
            return Err(ProviderFailure::unavailable(
                id,
                format!("retCode {} - {}", response.ret_code, response.ret_msg),
            ));
        }

        let ticker = response
            .result
            .and_then(|r| r.list.into_iter().next())
            .ok_or_else(|| {
                ProviderFailure::malformed(
                    id.clone(),
                    format!("No ticker data for {}", symbol),
                )
            })?;

        // price24hPcnt is a fraction (0.025 == 2.5%)
        let change_fraction = decimal_field(&id, "price24hPcnt", ticker.get("price24hPcnt"))?;
        let change_24h = change_fraction
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(|| {
                ProviderFailure::malformed(
                    id.clone(),
                    format!("price24hPcnt out of range: {}", change_fraction),
                )
            })?;

        Ok(MarketRecord {
            price: decimal_field(&id, "lastPrice", ticker.get("lastPrice"))?,
            change_24h,
            volume_24h: decimal_field(&id, "turnover24h", ticker.get("turnover24h"))?,
            as_of: millis_field(response.time.as_ref()).unwrap_or_else(Utc::now),
            provider: id,
            symbol,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use crate::transport::stub::StubTransport;
    use rust_decimal_macros::dec;

    const URL: &str = "https://api.bybit.com/v5/market/tickers";

    fn provider(stub: StubTransport) -> (Arc<StubTransport>, BybitProvider) {
        let stub = Arc::new(stub);
        let provider = BybitProvider::new(stub.clone(), "https://api.bybit.com");
        (stub, provider)
    }

    fn query() -> MarketQuery {
        MarketQuery::new("BTC", "USDT").unwrap()
    }

    #[tokio::test]
    async fn test_maps_ticker_and_scales_percent() {
        let (stub, provider) = provider(StubTransport::new().respond(
            URL,
            200,
            r#"{
                "retCode": 0,
                "retMsg": "OK",
                "result": {
                    "category": "spot",
                    "list": [
                        {
                            "symbol": "BTCUSDT",
                            "lastPrice": "63950.55",
                            "price24hPcnt": "0.025",
                            "turnover24h": "420000000.0"
                        }
                    ]
                },
                "time": 1716216000000
            }"#,
        ));

        let record = provider.fetch_market(&query()).await.unwrap();
        assert_eq!(record.provider, "bybit");
        assert_eq!(record.price, dec!(63950.55));
        assert_eq!(record.change_24h, dec!(2.5));
        assert_eq!(record.volume_24h, dec!(420000000.0));
        assert_eq!(record.as_of.timestamp_millis(), 1716216000000);

        let sent = stub.request_for(URL).unwrap();
        assert_eq!(sent.query_value("category"), Some("spot"));
        assert_eq!(sent.query_value("symbol"), Some("BTCUSDT"));
    }

    #[tokio::test]
    async fn test_empty_list_is_malformed() {
        let (_, provider) = provider(StubTransport::new().respond(
            URL,
            200,
            r#"{"retCode":0,"retMsg":"OK","result":{"list":[]}}"#,
        ));
        let failure = provider.fetch_market(&query()).await.unwrap_err();
        assert_eq!(failure.reason, FailureKind::MalformedResponse);
        assert_eq!(failure.detail, "No ticker data for BTCUSDT");
    }

    #[tokio::test]
    async fn test_error_envelope_is_unavailable() {
        let (_, provider) = provider(StubTransport::new().respond(
            URL,
            200,
            r#"{"retCode":10001,"retMsg":"Not supported symbols","result":{}}"#,
        ));
        let failure = provider.fetch_market(&query()).await.unwrap_err();
        assert_eq!(failure.reason, FailureKind::Unavailable);
        assert!(failure.detail.contains("Not supported symbols"));
    }

    #[tokio::test]
    async fn test_missing_change_is_malformed() {
        let (_, provider) = provider(StubTransport::new().respond(
            URL,
            200,
            r#"{"retCode":0,"result":{"list":[{"lastPrice":"0"}]}}"#,
        ));
        let failure = provider.fetch_market(&query()).await.unwrap_err();
        assert_eq!(failure.reason, FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_oversized_percent_is_malformed() {
        let (_, provider) = provider(StubTransport::new().respond(
            URL,
            200,
            r#"{"retCode":0,"result":{"list":[{"lastPrice":"1","price24hPcnt":"79228162514264337593543950335","turnover24h":"1"}]}}"#,
        ));
        let failure = provider.fetch_market(&query()).await.unwrap_err();
        assert_eq!(failure.reason, FailureKind::MalformedResponse);
        assert_eq!(failure.provider, "bybit");
        assert!(failure.detail.starts_with("price24hPcnt out of range"));
    }

    #[tokio::test]
    async fn test_throttled() {
        let (_, provider) = provider(StubTransport::new().respond(URL, 429, ""));
        let failure = provider.fetch_market(&query()).await.unwrap_err();
        assert_eq!(failure.reason, FailureKind::RateLimited);
    }
}
