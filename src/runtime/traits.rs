//! Trait abstractions for runtime I/O
//!
//! The controller only talks to the backend through [`TransportGateway`], so
//! tests can drive it with mock implementations.

use crate::transport::{ChatReply, NewSession, TransportError};
use async_trait::async_trait;
use std::sync::Arc;

/// Request/response capability to the assistant backend
///
/// Each call is single-shot: no retries, no streaming.
#[async_trait]
pub trait TransportGateway: Send + Sync {
    /// Create a session for `brand_id`
    async fn create_session(&self, brand_id: &str) -> Result<NewSession, TransportError>;

    /// Send one user message on an established session
    async fn send_chat_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatReply, TransportError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: TransportGateway + ?Sized> TransportGateway for Arc<T> {
    async fn create_session(&self, brand_id: &str) -> Result<NewSession, TransportError> {
        (**self).create_session(brand_id).await
    }

    async fn send_chat_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatReply, TransportError> {
        (**self).send_chat_message(session_id, message).await
    }
}
