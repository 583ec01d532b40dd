use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::payload::WebhookPayload;
use super::transport::{HttpTransport, TransportError, WebhookTransport};
use crate::config::WebhookConfig;
use crate::observer::{SharedObserver, TracingObserver, WorkflowEvent};

/// Delivers webhook payloads to every configured endpoint
pub struct NotificationDispatcher {
    endpoints: Vec<String>,
    transport: Arc<dyn WebhookTransport>,
    max_retries: u32,
    retry_delay: Duration,
    observer: SharedObserver,
}

impl NotificationDispatcher {
    pub fn new(endpoints: Vec<String>, transport: Arc<dyn WebhookTransport>) -> Self {
        Self {
            endpoints,
            transport,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            observer: TracingObserver::shared(),
        }
    }

    /// HTTP dispatcher configured from the `[webhooks]` section
    pub fn from_config(config: &WebhookConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(
            Duration::from_secs(config.timeout_seconds),
            &config.headers,
        )?;
        Ok(Self::new(config.endpoints.clone(), Arc::new(transport))
            .with_max_retries(config.max_retries)
            .with_retry_delay(Duration::from_millis(config.retry_delay_ms)))
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Try every endpoint in order; true if at least one answered 200.
    ///
    /// A failing endpoint never stops delivery to the ones after it, and a
    /// success never skips them either.
    pub async fn send(&self, payload: &WebhookPayload) -> bool {
        let body = match payload.to_json() {
            Ok(body) => body,
            Err(e) => {
                warn!(event = %payload.event(), "Could not serialize webhook payload: {}", e);
                return false;
            }
        };

        let mut delivered = 0usize;
        for endpoint in &self.endpoints {
            if self.send_to_endpoint(endpoint, &body).await {
                delivered += 1;
            }
        }

        info!(
            event = %payload.event(),
            workflow_id = %payload.workflow_id(),
            delivered,
            endpoints = self.endpoints.len(),
            "Webhook dispatch finished"
        );
        delivered > 0
    }

    // Transport failures wait `retry_delay` before the next attempt; non-200
    // answers are retried straight away. Zero retries means no request at all.
    async fn send_to_endpoint(&self, endpoint: &str, body: &str) -> bool {
        let attempts = self.max_retries;

        for attempt in 1..=attempts {
            match self.transport.post_json(endpoint, body).await {
                Ok(response) if response.status == 200 => {
                    self.observer.on_event(&WorkflowEvent::WebhookDelivered {
                        endpoint: endpoint.to_string(),
                        status: response.status,
                    });
                    return true;
                }
                Ok(response) => {
                    self.observer.on_event(&WorkflowEvent::WebhookRejected {
                        endpoint: endpoint.to_string(),
                        status: response.status,
                        body: response.body,
                    });
                }
                Err(error) => {
                    self.observer.on_event(&WorkflowEvent::WebhookTransportFailed {
                        endpoint: endpoint.to_string(),
                        attempt,
                        error: error.to_string(),
                    });
                    if attempt < attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        false
    }
}
