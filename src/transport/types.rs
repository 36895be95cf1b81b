//! Wire types for the chat service

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body of `POST /chat`
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<&'a str>,
}

/// Parsed body of a successful `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    /// Issued by the service on the first exchange of a conversation
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatReply {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            session_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Outcome of `GET /healthz`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub reachable: bool,
    /// Round trip time, only measured when the service answered 2xx
    pub latency: Option<Duration>,
}

impl HealthReport {
    pub fn reachable(latency: Duration) -> Self {
        Self {
            reachable: true,
            latency: Some(latency),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            latency: None,
        }
    }

    pub fn latency_millis(&self) -> Option<u128> {
        self.latency.map(|d| d.as_millis())
    }
}
