//! Transport trait and the request/response values passed across it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use thiserror::Error;

/// Errors raised before an HTTP status is available.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within the client timeout.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other failure while sending or reading the body.
    #[error("request failed: {0}")]
    Request(String),

    /// The transport has been shut down.
    #[error("transport is shut down")]
    Closed,
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// An outbound request.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// Overrides the client-wide timeout for this request only
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Value of a header set on this request (case-insensitive name match).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of a query parameter set on this request.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A completed exchange: the status plus the full body as text.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Long-lived, shareable HTTP transport.
///
/// Implementations must be safe for many concurrent callers across many
/// concurrent requests and own no per-request state.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request and read the whole body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Stop admitting requests and release pooled resources.
    ///
    /// Default is a no-op for transports that own nothing.
    async fn shutdown(&self) {}
}
