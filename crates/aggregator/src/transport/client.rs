//! Pooled reqwest client with an explicit lifecycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::traits::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use crate::config::TransportConfig;
use crate::errors::EngineError;

/// Shared HTTP client for every adapter in the process.
///
/// Build it once at startup with [`HttpClient::new`] and call
/// [`shutdown`](HttpTransport::shutdown) before exit. Connections are reused
/// for the lifetime of the value; in-flight requests are capped at
/// `max_connections`.
pub struct HttpClient {
    client: RwLock<Option<Client>>,
    permits: Arc<Semaphore>,
    max_connections: u32,
    closing: AtomicBool,
}

impl HttpClient {
    pub fn new(config: &TransportConfig) -> Result<Self, EngineError> {
        let max_connections = u32::try_from(config.max_connections).map_err(|_| {
            EngineError::Configuration(format!(
                "max_connections {} is out of range",
                config.max_connections
            ))
        })?;

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.max_idle_connections)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                EngineError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        info!(
            "HTTP client ready (timeout {:?}, max connections {}, max idle {})",
            config.timeout, config.max_connections, config.max_idle_connections
        );

        Ok(Self {
            client: RwLock::new(Some(client)),
            permits: Arc::new(Semaphore::new(config.max_connections)),
            max_connections,
            closing: AtomicBool::new(false),
        })
    }

    /// Clone of the live client, `None` once shut down.
    fn live_client(&self) -> Option<Client> {
        self.client
            .read()
            .unwrap_or_else(|poisoned| {
                warn!("HTTP client lock was poisoned, recovering");
                poisoned.into_inner()
            })
            .clone()
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if self.closing.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| TransportError::Closed)?;
        let client = self.live_client().ok_or(TransportError::Closed)?;

        let mut builder = client.request(request.method.clone(), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        debug!(
            "HTTP {} {} with {} params",
            request.method,
            request.url,
            request.query.len()
        );

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }

    async fn shutdown(&self) {
        if self.closing.swap(true, Ordering::AcqRel) {
            return;
        }

        // Every permit back in the pool means nothing is in flight
        match self.permits.acquire_many(self.max_connections).await {
            Ok(permits) => {
                permits.forget();
                self.permits.close();
            }
            Err(_) => debug!("HTTP client permits already closed"),
        }

        let released = self
            .client
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if released.is_some() {
            info!("HTTP client shut down");
        }
    }
}
