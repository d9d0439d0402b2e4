//! Process-start configuration.
//!
//! Everything here is read once when the engine is built. Values come from the
//! process environment (a `.env` file is honored), with the defaults below.

use std::time::Duration;

use crate::errors::EngineError;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_CONNECTIONS: usize = 20;
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 10;
pub const DEFAULT_USER_AGENT: &str =
    "cryptointel/0.1 (+https://example.com; contact=admin@example.com)";
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(12);

pub const DEFAULT_BINANCE_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_BYBIT_BASE_URL: &str = "https://api.bybit.com";
pub const DEFAULT_COINCAP_BASE_URL: &str = "https://api.coincap.io/v2";

/// Shared HTTP client settings.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportConfig {
    /// Per-request timeout applied by the client (`HTTP_TIMEOUT`, seconds)
    pub timeout: Duration,
    /// Upper bound on in-flight requests (`HTTP_MAX_CONNECTIONS`)
    pub max_connections: usize,
    /// Idle keep-alive connections retained per host (`HTTP_MAX_KEEPALIVE`)
    pub max_idle_connections: usize,
    /// `HTTP_USER_AGENT`
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Upstream locations for the market exchanges.
#[derive(Clone, Debug, PartialEq)]
pub struct MarketEndpoints {
    pub binance_base_url: String,
    pub bybit_base_url: String,
    pub coincap_base_url: String,
    /// Bearer credential, sent to CoinCap only
    pub coincap_api_key: Option<String>,
}

impl Default for MarketEndpoints {
    fn default() -> Self {
        Self {
            binance_base_url: DEFAULT_BINANCE_BASE_URL.to_string(),
            bybit_base_url: DEFAULT_BYBIT_BASE_URL.to_string(),
            coincap_base_url: DEFAULT_COINCAP_BASE_URL.to_string(),
            coincap_api_key: None,
        }
    }
}

/// How the coordinator bounds and retries a fan-out.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchPolicy {
    /// Global deadline for one logical request
    pub deadline: Duration,
    /// Optional bound on each single provider attempt
    pub provider_timeout: Option<Duration>,
    /// Extra attempts for transient failures; 0 disables retries
    pub retries: u32,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            deadline: DEFAULT_DEADLINE,
            provider_timeout: None,
            retries: 0,
        }
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineConfig {
    pub transport: TransportConfig,
    pub endpoints: MarketEndpoints,
    pub policy: FetchPolicy,
}

impl EngineConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, EngineError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let transport = TransportConfig {
            timeout: parse_seconds("HTTP_TIMEOUT", get("HTTP_TIMEOUT"))?
                .unwrap_or(DEFAULT_HTTP_TIMEOUT),
            max_connections: parse_count("HTTP_MAX_CONNECTIONS", get("HTTP_MAX_CONNECTIONS"))?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            max_idle_connections: parse_count("HTTP_MAX_KEEPALIVE", get("HTTP_MAX_KEEPALIVE"))?
                .unwrap_or(DEFAULT_MAX_IDLE_CONNECTIONS),
            user_agent: get("HTTP_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        let endpoints = MarketEndpoints {
            binance_base_url: get("BINANCE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BINANCE_BASE_URL.to_string()),
            bybit_base_url: get("BYBIT_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BYBIT_BASE_URL.to_string()),
            coincap_base_url: get("COINCAP_BASE_URL")
                .unwrap_or_else(|| DEFAULT_COINCAP_BASE_URL.to_string()),
            coincap_api_key: get("COINCAP_API_KEY"),
        };

        let retries = match get("PROVIDER_RETRIES") {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                EngineError::Configuration(format!(
                    "PROVIDER_RETRIES must be a non-negative integer, got '{}'",
                    raw
                ))
            })?,
            None => 0,
        };

        let policy = FetchPolicy {
            deadline: parse_seconds("AGGREGATE_DEADLINE", get("AGGREGATE_DEADLINE"))?
                .unwrap_or(DEFAULT_DEADLINE),
            provider_timeout: parse_seconds("PROVIDER_TIMEOUT", get("PROVIDER_TIMEOUT"))?,
            retries,
        };

        Ok(Self {
            transport,
            endpoints,
            policy,
        })
    }
}

fn parse_seconds(key: &str, raw: Option<String>) -> Result<Option<Duration>, EngineError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => Ok(Some(Duration::from_secs_f64(secs))),
        _ => Err(EngineError::Configuration(format!(
            "{} must be a positive number of seconds, got '{}'",
            key, raw
        ))),
    }
}

fn parse_count(key: &str, raw: Option<String>) -> Result<Option<usize>, EngineError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(Some(n)),
        _ => Err(EngineError::Configuration(format!(
            "{} must be an integer >= 1, got '{}'",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<EngineConfig, EngineError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.transport.timeout, Duration::from_secs(10));
        assert_eq!(config.transport.max_connections, 20);
        assert_eq!(config.transport.max_idle_connections, 10);
        assert_eq!(config.transport.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.endpoints.coincap_api_key, None);
        assert_eq!(config.policy.retries, 0);
        assert_eq!(config.policy.provider_timeout, None);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HTTP_TIMEOUT", "2.5"),
            ("HTTP_MAX_CONNECTIONS", "50"),
            ("HTTP_MAX_KEEPALIVE", "5"),
            ("HTTP_USER_AGENT", "tests/1.0"),
            ("COINCAP_API_KEY", "secret-token"),
            ("BINANCE_BASE_URL", "http://localhost:9000"),
            ("AGGREGATE_DEADLINE", "3"),
            ("PROVIDER_TIMEOUT", "1"),
            ("PROVIDER_RETRIES", "2"),
        ])
        .unwrap();

        assert_eq!(config.transport.timeout, Duration::from_millis(2500));
        assert_eq!(config.transport.max_connections, 50);
        assert_eq!(config.transport.max_idle_connections, 5);
        assert_eq!(config.transport.user_agent, "tests/1.0");
        assert_eq!(
            config.endpoints.coincap_api_key.as_deref(),
            Some("secret-token")
        );
        assert_eq!(config.endpoints.binance_base_url, "http://localhost:9000");
        assert_eq!(config.endpoints.bybit_base_url, DEFAULT_BYBIT_BASE_URL);
        assert_eq!(config.policy.deadline, Duration::from_secs(3));
        assert_eq!(config.policy.provider_timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.policy.retries, 2);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("HTTP_TIMEOUT", "  "), ("COINCAP_API_KEY", "")]).unwrap();
        assert_eq!(config.transport.timeout, DEFAULT_HTTP_TIMEOUT);
        assert_eq!(config.endpoints.coincap_api_key, None);
    }

    #[test]
    fn test_rejects_non_positive_timeout() {
        assert!(matches!(
            config_from(&[("HTTP_TIMEOUT", "0")]),
            Err(EngineError::Configuration(_))
        ));
        assert!(matches!(
            config_from(&[("HTTP_TIMEOUT", "-1")]),
            Err(EngineError::Configuration(_))
        ));
        assert!(config_from(&[("HTTP_TIMEOUT", "soon")]).is_err());
    }

    #[test]
    fn test_rejects_zero_connections() {
        assert!(config_from(&[("HTTP_MAX_CONNECTIONS", "0")]).is_err());
        assert!(config_from(&[("HTTP_MAX_KEEPALIVE", "many")]).is_err());
    }

    #[test]
    fn test_rejects_bad_retries() {
        assert!(config_from(&[("PROVIDER_RETRIES", "-1")]).is_err());
    }
}
