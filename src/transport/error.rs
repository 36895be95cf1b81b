//! Transport error types

use thiserror::Error;

/// Failure of a chat request, with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    /// HTTP status when the service answered with a non-success code
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn status(code: u16) -> Self {
        Self {
            kind: TransportErrorKind::Status,
            message: format!("HTTP error! status: {code}"),
            status: Some(code),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Decode, message)
    }
}

/// Where the exchange broke down.
///
/// The controller treats every kind the same way; the kind only feeds logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, reset, DNS failure, body read failure
    Network,
    /// Service answered with a non-2xx status
    Status,
    /// Response body was not the expected JSON
    Decode,
}

impl TransportErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Status => "status",
            Self::Decode => "decode",
        }
    }
}
