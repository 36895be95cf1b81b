//! Transport client for the remote chat service
//!
//! Two calls: `POST /chat` to exchange a message, `GET /healthz` to probe
//! reachability. Implementations hold no conversation state.

mod error;
mod http;
mod types;

pub use error::{TransportError, TransportErrorKind};
pub use http::HttpTransport;
pub use types::{ChatReply, HealthReport};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for chat service clients
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one user message, reusing `session_id` when the conversation has one
    async fn send_message(
        &self,
        text: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, TransportError>;

    /// Probe the service. Failures fold into `reachable = false`.
    async fn check_health(&self) -> HealthReport;
}

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn send_message(
        &self,
        text: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, TransportError> {
        (**self).send_message(text, session_id).await
    }

    async fn check_health(&self) -> HealthReport {
        (**self).check_health().await
    }
}

/// Logging wrapper for chat transports
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T: ChatTransport> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: ChatTransport> ChatTransport for LoggingTransport<T> {
    async fn send_message(
        &self,
        text: &str,
        session_id: Option<&str>,
    ) -> Result<ChatReply, TransportError> {
        let start = std::time::Instant::now();
        let result = self.inner.send_message(text, session_id).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    duration_ms = %duration.as_millis(),
                    has_session = session_id.is_some(),
                    issued_session = reply.session_id.is_some(),
                    answer_chars = reply.answer.chars().count(),
                    "Chat request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    status = ?e.status,
                    error = %e.message,
                    "Chat request failed"
                );
            }
        }

        result
    }

    async fn check_health(&self) -> HealthReport {
        let report = self.inner.check_health().await;
        if report.reachable {
            tracing::debug!(latency_ms = ?report.latency_millis(), "Health check passed");
        } else {
            tracing::warn!("Health check failed, chat service unreachable");
        }
        report
    }
}
