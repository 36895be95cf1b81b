//! reqwest implementation of the chat transport

use super::types::{ChatReply, ChatRequest, HealthReport};
use super::{ChatTransport, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;

/// HTTP client for the chat service
pub struct HttpTransport {
    client: Client,
    chat_url: String,
    health_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Build on an existing client (shared connection pool, custom TLS, ...)
    pub fn with_client(client: Client, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            client,
            chat_url: format!("{base}/chat"),
            health_url: format!("{base}/healthz"),
        }
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }
}

fn classify_send_error(e: &reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::network(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        TransportError::network(format!("Connection failed: {e}"))
    } else {
        TransportError::network(format!("Request failed: {e}"))
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send_message(
        &self,
        text: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, TransportError> {
        let request = ChatRequest {
            message: text,
            session_id,
        };

        let response = self
            .client
            .post(&self.chat_url)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::network(format!("Failed to read response: {e}")))?;

        serde_json::from_str(&body)
            .map_err(|e| TransportError::decode(format!("Failed to parse response: {e}")))
    }

    async fn check_health(&self) -> HealthReport {
        let start = Instant::now();
        match self.client.get(&self.health_url).send().await {
            Ok(response) if response.status().is_success() => {
                HealthReport::reachable(start.elapsed())
            }
            Ok(response) => {
                tracing::debug!(status = %response.status(), "Health endpoint returned non-success");
                HealthReport::unreachable()
            }
            Err(e) => {
                tracing::debug!(error = %e, "Health endpoint unreachable");
                HealthReport::unreachable()
            }
        }
    }
}
