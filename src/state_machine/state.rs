//! Conversation state types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay between session creation and the welcome message
pub const DEFAULT_WELCOME_DELAY: Duration = Duration::from_millis(500);

/// A backend-assigned conversation, scoped to one brand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub brand_id: String,
}

/// Controller state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatState {
    /// No session; the only state that accepts `StartSession`
    #[default]
    NoSession,

    /// Session creation in flight, or created and waiting for the welcome
    /// message to be posted
    SessionPending {
        brand_id: String,
        /// Set once the backend has assigned an id
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },

    /// Session active, no outstanding message
    Idle { session: Session },

    /// Chat request in flight; the typing indicator is showing
    MessagePending { session: Session },
}

impl ChatState {
    pub fn name(&self) -> &'static str {
        match self {
            ChatState::NoSession => "no_session",
            ChatState::SessionPending { .. } => "session_pending",
            ChatState::Idle { .. } => "idle",
            ChatState::MessagePending { .. } => "message_pending",
        }
    }

    /// Session once the backend has confirmed it
    pub fn session(&self) -> Option<&Session> {
        match self {
            ChatState::Idle { session } | ChatState::MessagePending { session } => Some(session),
            ChatState::NoSession | ChatState::SessionPending { .. } => None,
        }
    }

    /// Brand the current (or pending) session belongs to
    pub fn brand_id(&self) -> Option<&str> {
        match self {
            ChatState::NoSession => None,
            ChatState::SessionPending { brand_id, .. } => Some(brand_id),
            ChatState::Idle { session } | ChatState::MessagePending { session } => {
                Some(&session.brand_id)
            }
        }
    }

    /// Check if a request or the welcome delay is outstanding
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ChatState::SessionPending { .. } | ChatState::MessagePending { .. }
        )
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ChatState::Idle { .. })
    }
}

/// Configuration for a controller (immutable)
#[derive(Debug, Clone)]
pub struct ChatContext {
    /// Brand used when the widget is opened without an explicit start
    pub default_brand_id: String,
    pub welcome_delay: Duration,
}

impl ChatContext {
    pub fn new(default_brand_id: impl Into<String>) -> Self {
        Self {
            default_brand_id: default_brand_id.into(),
            welcome_delay: DEFAULT_WELCOME_DELAY,
        }
    }

    pub fn with_welcome_delay(mut self, delay: Duration) -> Self {
        self.welcome_delay = delay;
        self
    }
}
