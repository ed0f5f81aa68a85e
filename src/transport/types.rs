//! Backend wire format and gateway results

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /start_session`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub brand_id: String,
}

/// Response to `POST /start_session`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    /// Backend greeting; the widget posts its own welcome instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

/// Response to `POST /chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub related_products: Vec<Value>,
}

/// Error body returned by the development backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Session created by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub session_id: String,
}

impl From<StartSessionResponse> for NewSession {
    fn from(resp: StartSessionResponse) -> Self {
        Self {
            session_id: resp.session_id,
        }
    }
}

/// Assistant reply to one chat message
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text: String,
    pub related_products: Vec<Value>,
}

impl ChatReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            related_products: Vec::new(),
        }
    }
}

impl From<ChatResponse> for ChatReply {
    fn from(resp: ChatResponse) -> Self {
        Self {
            text: resp.response,
            related_products: resp.related_products,
        }
    }
}
