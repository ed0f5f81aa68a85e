//! HTTP implementation of the transport gateway

use super::types::{
    ChatReply, ChatRequest, ChatResponse, NewSession, StartSessionRequest, StartSessionResponse,
};
use super::TransportError;
use crate::runtime::TransportGateway;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Gateway speaking the backend's JSON-over-HTTP protocol
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Build a gateway for `base_url`, optionally bounding every request
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, TransportError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::from_status(status, &body));
        }

        response.json::<Resp>().await.map_err(|e| {
            TransportError::decode(format!("Invalid response from {path}: {e}"))
        })
    }
}

#[async_trait]
impl TransportGateway for HttpGateway {
    async fn create_session(&self, brand_id: &str) -> Result<NewSession, TransportError> {
        let request = StartSessionRequest {
            brand_id: brand_id.to_string(),
        };
        let response: StartSessionResponse = self.post_json("/start_session", &request).await?;
        Ok(response.into())
    }

    async fn send_chat_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatReply, TransportError> {
        let request = ChatRequest {
            session_id: session_id.to_string(),
            message: message.to_string(),
        };
        let response: ChatResponse = self.post_json("/chat", &request).await?;
        Ok(response.into())
    }
}
