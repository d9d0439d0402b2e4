//! CoinCap asset adapter.
//!
//! `GET /assets?search=BTC`. CoinCap prices everything in USD, so the quote
//! symbol only shows up in the record's `symbol`. This is the one provider
//! that accepts a bearer credential; without one the public quota applies.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{MarketQuery, MarketRecord, ProviderFailure, ProviderId};
use crate::provider::response::{decimal_field, fetch_text, millis_field, parse_json};
use crate::provider::MarketProvider;
use crate::transport::{HttpRequest, HttpTransport};

const PROVIDER_ID: &str = "coincap";

#[derive(Debug, Deserialize)]
struct AssetsResponse {
    #[serde(default)]
    data: Vec<Value>,
    /// Response time (epoch ms)
    timestamp: Option<Value>,
}

pub struct CoinCapProvider {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_key: Option<String>,
}

impl CoinCapProvider {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

/// Exact symbol match wins; otherwise CoinCap's best search hit.
fn pick_asset(data: Vec<Value>, base: &str) -> Option<Value> {
    let exact = data.iter().position(|entry| {
        entry
            .get("symbol")
            .and_then(Value::as_str)
            .is_some_and(|s| s.eq_ignore_ascii_case(base))
    });
    let index = exact.unwrap_or(0);
    data.into_iter().nth(index)
}

#[async_trait]
impl MarketProvider for CoinCapProvider {
    fn id(&self) -> ProviderId {
        PROVIDER_ID.into()
    }

    async fn fetch_market(&self, query: &MarketQuery) -> Result<MarketRecord, ProviderFailure> {
        let id = self.id();
        debug!("Fetching asset {} from CoinCap", query.base);

        let mut request =
            HttpRequest::get(format!("{}/assets", self.base_url)).query("search", query.base.as_str());
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let body = fetch_text(self.transport.as_ref(), &id, request).await?;
        let response: AssetsResponse = parse_json(&id, &body)?;

        let asset = pick_asset(response.data, &query.base).ok_or_else(|| {
            ProviderFailure::malformed(id.clone(), format!("No asset data for {}", query.base))
        })?;

        Ok(MarketRecord {
            price: decimal_field(&id, "priceUsd", asset.get("priceUsd"))?,
            change_24h: decimal_field(&id, "changePercent24Hr", asset.get("changePercent24Hr"))?,
            volume_24h: decimal_field(&id, "volumeUsd24Hr", asset.get("volumeUsd24Hr"))?,
            as_of: millis_field(response.timestamp.as_ref()).unwrap_or_else(Utc::now),
            provider: id,
            symbol: query.pair(),
        })
    }
}
