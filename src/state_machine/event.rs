//! Events that can occur in a conversation

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // Widget events
    /// Widget shown; starts a session for the default brand if none exists
    Open,
    /// Widget hidden; the session is kept
    Close,
    DraftChanged {
        text: String,
    },
    StartSession {
        brand_id: String,
    },
    UserMessage {
        text: String,
    },
    Reset,

    // Gateway events
    SessionCreated {
        session_id: String,
    },
    SessionFailed {
        message: String,
    },
    /// Presentational delay after session creation elapsed
    WelcomeDue,
    ChatReply {
        text: String,
    },
    ChatFailed {
        message: String,
    },
}

impl Event {
    /// Check if this event reports the outcome of background work
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Event::SessionCreated { .. }
                | Event::SessionFailed { .. }
                | Event::WelcomeDue
                | Event::ChatReply { .. }
                | Event::ChatFailed { .. }
        )
    }
}
