// HTTP plumbing for webhook delivery, behind a trait so tests can script responses

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Status and body returned by a webhook receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },
    #[error("could not connect to {endpoint}: {message}")]
    Connection { endpoint: String, message: String },
    #[error("request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },
    #[error("invalid header '{name}'")]
    InvalidHeader { name: String },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl TransportError {
    fn from_reqwest(endpoint: &str, error: reqwest::Error) -> Self {
        let endpoint = endpoint.to_string();
        if error.is_timeout() {
            TransportError::Timeout { endpoint }
        } else if error.is_connect() {
            TransportError::Connection {
                endpoint,
                message: error.to_string(),
            }
        } else {
            TransportError::Request {
                endpoint,
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// POST a JSON document to `endpoint`.
    ///
    /// Any HTTP response, whatever its status, is `Ok`; `Err` means the
    /// request never produced a response.
    async fn post_json(&self, endpoint: &str, body: &str)
        -> Result<TransportResponse, TransportError>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Client with a per-request timeout. `Content-Type: application/json` is
    /// always sent; `headers` are added on top and may override it.
    pub fn new(timeout: Duration, headers: &HashMap<String, String>) -> Result<Self, TransportError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TransportError::InvalidHeader { name: name.clone() })?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| TransportError::InvalidHeader { name: name.clone() })?;
            default_headers.insert(header_name, header_value);
        }

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    async fn post_json(
        &self,
        endpoint: &str,
        body: &str,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(endpoint)
            .body(body.to_owned())
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(endpoint, e))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(TransportResponse { status, body })
    }
}
