//! Backend transport
//!
//! Session creation and message exchange with the chat backend, behind the
//! [`TransportGateway`] trait so the controller can be driven by mocks.

mod error;
mod http;
mod types;

pub use error::{TransportError, TransportErrorKind};
pub use http::HttpGateway;
pub use types::*;

use crate::runtime::TransportGateway;
use async_trait::async_trait;
use std::time::Instant;

/// Logging wrapper for gateways
pub struct LoggingGateway<G> {
    inner: G,
}

impl<G: TransportGateway> LoggingGateway<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<G: TransportGateway> TransportGateway for LoggingGateway<G> {
    async fn create_session(&self, brand_id: &str) -> Result<NewSession, TransportError> {
        let start = Instant::now();
        let result = self.inner.create_session(brand_id).await;
        let duration = start.elapsed();

        match &result {
            Ok(session) => {
                tracing::info!(
                    brand = %brand_id,
                    session_id = %session.session_id,
                    duration_ms = %duration.as_millis(),
                    "Session created"
                );
            }
            Err(e) => {
                tracing::error!(
                    brand = %brand_id,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Session request failed"
                );
            }
        }

        result
    }

    async fn send_chat_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatReply, TransportError> {
        let start = Instant::now();
        let result = self.inner.send_chat_message(session_id, message).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    session_id = %session_id,
                    duration_ms = %duration.as_millis(),
                    reply_len = reply.text.len(),
                    related_products = reply.related_products.len(),
                    "Chat request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session_id,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Chat request failed"
                );
            }
        }

        result
    }
}
