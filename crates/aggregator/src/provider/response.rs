//! Response classification shared by all adapters.
//!
//! Maps transport errors and HTTP statuses onto [`FailureKind`], and parses
//! loosely typed upstream fields (numbers sent as strings, epoch-millisecond
//! timestamps) into the normalized types.

use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::FailureKind;
use crate::models::{ProviderFailure, ProviderId};
use crate::transport::{HttpRequest, HttpTransport, TransportError};

/// Longest slice of an error body copied into a failure detail.
const DETAIL_SNIPPET_LEN: usize = 200;

/// Common error envelopes (`{"msg": ...}`, `{"error": ...}`, `{"message": ...}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    msg: Option<String>,
    error: Option<String>,
    message: Option<String>,
}

/// Send `request` and return the body of a 2xx response.
pub(crate) async fn fetch_text(
    transport: &dyn HttpTransport,
    provider: &ProviderId,
    request: HttpRequest,
) -> Result<String, ProviderFailure> {
    let response = transport
        .send(request)
        .await
        .map_err(|e| transport_failure(provider, e))?;

    if response.is_success() {
        return Ok(response.body);
    }

    let kind = status_failure_kind(response.status);
    let detail = match error_message(&response.body) {
        Some(message) => format!("HTTP {} - {}", response.status, message),
        None => format!("HTTP {}", response.status),
    };
    debug!("{} answered {}", provider, detail);
    Err(ProviderFailure::new(provider.clone(), kind, detail))
}

pub(crate) fn transport_failure(provider: &ProviderId, error: TransportError) -> ProviderFailure {
    let kind = match error {
        TransportError::Timeout => FailureKind::Timeout,
        TransportError::Connect(_) | TransportError::Request(_) | TransportError::Closed => {
            FailureKind::Unavailable
        }
    };
    ProviderFailure::new(provider.clone(), kind, error.to_string())
}

/// 429 and Binance's 418 IP ban are throttling; everything else is an outage.
pub(crate) fn status_failure_kind(status: u16) -> FailureKind {
    match status {
        429 | 418 => FailureKind::RateLimited,
        _ => FailureKind::Unavailable,
    }
}

fn error_message(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.msg.or(parsed.error).or(parsed.message) {
            return Some(message);
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(DETAIL_SNIPPET_LEN).collect())
    }
}

pub(crate) fn parse_json<T: DeserializeOwned>(
    provider: &ProviderId,
    body: &str,
) -> Result<T, ProviderFailure> {
    serde_json::from_str(body).map_err(|e| {
        ProviderFailure::malformed(provider.clone(), format!("Failed to parse response: {}", e))
    })
}

/// Parse a required numeric field sent either as a JSON number or a string.
pub(crate) fn decimal_field(
    provider: &ProviderId,
    name: &str,
    value: Option<&Value>,
) -> Result<Decimal, ProviderFailure> {
    let parsed = match value {
        Some(Value::String(s)) => parse_decimal(s),
        Some(Value::Number(n)) => parse_decimal(&n.to_string()),
        _ => {
            return Err(ProviderFailure::malformed(
                provider.clone(),
                format!("Missing field '{}'", name),
            ))
        }
    };
    parsed.ok_or_else(|| {
        let raw = value.map(Value::to_string).unwrap_or_default();
        ProviderFailure::malformed(
            provider.clone(),
            format!("Field '{}' is not a number: {}", name, raw),
        )
    })
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Epoch-millisecond timestamp sent as a number or a string.
pub(crate) fn millis_field(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let millis = match value? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Utc.timestamp_millis_opt(millis).single()
}
