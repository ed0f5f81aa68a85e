//! Effects produced by state transitions

use crate::store::Role;
use std::time::Duration;

/// Effects to be executed after state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Format `text` and append it to the message store
    PostMessage { role: Role, text: String },

    /// Append the typing indicator and remember its id
    ShowTyping,

    /// Remove the remembered typing indicator, if any
    HideTyping,

    /// Empty the input buffer
    ClearDraft,

    /// Replace the input buffer
    SetDraft { text: String },

    ShowWidget,
    HideWidget,

    /// Ask the gateway for a new session
    CreateSession { brand_id: String },

    /// Deliver `WelcomeDue` after `delay`
    ScheduleWelcome { delay: Duration },

    /// Send a chat message on an established session
    SendChat { session_id: String, message: String },

    /// Tell the user the backend could not be reached
    ReportConnectivityError { message: String },

    /// Drop the message log, draft and any outstanding work
    ClearConversation,
}

impl Effect {
    pub fn post_user(text: impl Into<String>) -> Self {
        Effect::PostMessage {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn post_bot(text: impl Into<String>) -> Self {
        Effect::PostMessage {
            role: Role::Bot,
            text: text.into(),
        }
    }

    /// Check if executing this effect starts background work
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Effect::CreateSession { .. } | Effect::ScheduleWelcome { .. } | Effect::SendChat { .. }
        )
    }
}
