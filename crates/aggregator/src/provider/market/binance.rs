//! Binance spot market adapter.
//!
//! Uses the public `GET /api/v3/ticker/24hr?symbol=BTCUSDT` endpoint, which
//! needs no credential. Numeric fields arrive as strings.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::models::{MarketQuery, MarketRecord, ProviderFailure, ProviderId};
use crate::provider::response::{decimal_field, fetch_text, millis_field, parse_json};
use crate::provider::MarketProvider;
use crate::transport::{HttpRequest, HttpTransport};

const PROVIDER_ID: &str = "binance";

pub struct BinanceProvider {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
}

impl BinanceProvider {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn ticker_url(&self) -> String {
        format!("{}/api/v3/ticker/24hr", self.base_url)
    }
}

#[async_trait]
impl MarketProvider for BinanceProvider {
    fn id(&self) -> ProviderId {
        PROVIDER_ID.into()
    }

    async fn fetch_market(&self, query: &MarketQuery) -> Result<MarketRecord, ProviderFailure> {
        let id = self.id();
        let symbol = query.pair();
        debug!("Fetching 24h ticker for {} from Binance", symbol);

        let request = HttpRequest::get(self.ticker_url()).query("symbol", symbol.as_str());
        let body = fetch_text(self.transport.as_ref(), &id, request).await?;
        let payload: Value = parse_json(&id, &body)?;

        Ok(MarketRecord {
            price: decimal_field(&id, "lastPrice", payload.get("lastPrice"))?,
            change_24h: decimal_field(&id, "priceChangePercent", payload.get("priceChangePercent"))?,
            volume_24h: decimal_field(&id, "quoteVolume", payload.get("quoteVolume"))?,
            as_of: millis_field(payload.get("closeTime")).unwrap_or_else(Utc::now),
            provider: id,
            symbol,
        })
    }
}
