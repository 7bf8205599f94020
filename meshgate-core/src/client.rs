use crate::ctx::{GatewayRequest, GatewayResponse};
use crate::error::BackendError;
use async_trait::async_trait;
use http::header::{CONNECTION, CONTENT_LENGTH, HOST};
use std::time::Duration;

/// The backend call surface the router filter depends on.
///
/// Kept as a trait so tests can stub backends and the transport stack stays
/// swappable.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Send the inbound request to `modify_host` (`ip:port`), bounded by
    /// `timeout_ms`.
    async fn send(
        &self,
        request: &GatewayRequest,
        modify_host: &str,
        timeout_ms: u64,
    ) -> Result<GatewayResponse, BackendError>;
}

/// Production client on a shared reqwest connection pool.
#[derive(Debug, Clone)]
pub struct HttpBackendClient {
    client: reqwest::Client,
}

impl Default for HttpBackendClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpBackendClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn send(
        &self,
        request: &GatewayRequest,
        modify_host: &str,
        timeout_ms: u64,
    ) -> Result<GatewayResponse, BackendError> {
        let path_and_query = request
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or(request.path.as_str());
        let url = format!("http://{modify_host}{path_and_query}");

        // Hop-by-hop and recomputed headers must not be forwarded.
        let mut headers = request.headers.clone();
        headers.remove(HOST);
        headers.remove(CONNECTION);
        headers.remove(CONTENT_LENGTH);

        let response = self
            .client
            .request(request.method.clone(), &url)
            .headers(headers)
            .body(request.body.clone())
            .timeout(Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|err| classify(err, modify_host, timeout_ms))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|err| classify(err, modify_host, timeout_ms))?;

        Ok(GatewayResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify(err: reqwest::Error, host: &str, timeout_ms: u64) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout {
            host: host.to_string(),
            timeout_ms,
        }
    } else if err.is_connect() {
        BackendError::Connect {
            host: host.to_string(),
            detail: err.to_string(),
        }
    } else {
        BackendError::Read {
            host: host.to_string(),
            detail: err.to_string(),
        }
    }
}
