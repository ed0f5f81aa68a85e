//! Transport error types

use thiserror::Error;

/// Transport failure with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::ServerError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::InvalidRequest, message)
    }

    pub fn session_not_found(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::SessionNotFound, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Decode, message)
    }

    /// Classify a non-success HTTP response
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = error_detail(body);
        match status.as_u16() {
            400 | 422 => Self::invalid_request(format!("Rejected by backend: {detail}")),
            404 => Self::session_not_found(format!("Session not found: {detail}")),
            _ => Self::server_error(format!("Backend returned {status}: {detail}")),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(format!("Request timed out: {e}"))
        } else if e.is_decode() {
            Self::decode(format!("Invalid response body: {e}"))
        } else {
            Self::network(format!("Request failed: {e}"))
        }
    }
}

/// Pull the human-readable part out of an error body
///
/// Understands `{"detail": ..}` and `{"error": ..}` bodies; anything else is
/// returned as-is.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("detail")
                .or_else(|| v.get("error"))
                .and_then(|d| d.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, DNS, reset
    Network,
    /// Request exceeded the configured timeout
    Timeout,
    /// 5xx or unexpected status
    ServerError,
    /// Backend rejected the request (400, e.g. unknown brand)
    InvalidRequest,
    /// Session expired or unknown (404)
    SessionNotFound,
    /// Response body did not match the wire format
    Decode,
}
