//! Pure state transition function

use super::{ChatContext, ChatState, Effect, Event, Session};
use thiserror::Error;

/// Shown when a session cannot be established
pub const CONNECT_FAILURE_TEXT: &str = "Failed to connect to backend. Is it running?";

/// Posted as the bot reply when a chat request fails
pub const APOLOGY_TEXT: &str = "Sorry, I encountered an error connecting to the server.";

/// Greeting posted once a session is established
pub fn welcome_text(brand_id: &str) -> String {
    format!(
        "Hello! I am your {brand_id} AI assistant. Ask me about products, ingredients, or availability."
    )
}

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("Still waiting for the previous reply")]
    ReplyPending,
    #[error("No active session")]
    NoSession,
    #[error("Session is still being established")]
    SessionPending,
    #[error("A session is already active")]
    SessionActive,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Rejections the user should not be told about
    pub fn is_silent(&self) -> bool {
        matches!(self, TransitionError::EmptyInput)
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; all I/O is
/// described by the returned effects.
#[allow(clippy::too_many_lines)]
pub fn transition(
    state: &ChatState,
    context: &ChatContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Widget visibility
        // ============================================================
        (ChatState::NoSession, Event::Open) => {
            Ok(begin_session(context.default_brand_id.clone()).with_effect(Effect::ShowWidget))
        }

        (state, Event::Open) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::ShowWidget))
        }

        (state, Event::Close) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::HideWidget))
        }

        (state, Event::DraftChanged { text }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::SetDraft { text }))
        }

        // ============================================================
        // Session establishment
        // ============================================================
        (ChatState::NoSession, Event::StartSession { brand_id }) => Ok(begin_session(brand_id)),

        (ChatState::SessionPending { .. }, Event::StartSession { .. }) => {
            Err(TransitionError::SessionPending)
        }

        (ChatState::Idle { .. } | ChatState::MessagePending { .. }, Event::StartSession { .. }) => {
            Err(TransitionError::SessionActive)
        }

        (
            ChatState::SessionPending {
                brand_id,
                session_id: None,
            },
            Event::SessionCreated { session_id },
        ) => Ok(TransitionResult::new(ChatState::SessionPending {
            brand_id: brand_id.clone(),
            session_id: Some(session_id),
        })
        .with_effect(Effect::ScheduleWelcome {
            delay: context.welcome_delay,
        })),

        (
            ChatState::SessionPending {
                session_id: None, ..
            },
            Event::SessionFailed { message },
        ) => Ok(TransitionResult::new(ChatState::NoSession).with_effects([
            Effect::post_bot(CONNECT_FAILURE_TEXT),
            Effect::ReportConnectivityError { message },
        ])),

        (
            ChatState::SessionPending {
                brand_id,
                session_id: Some(session_id),
            },
            Event::WelcomeDue,
        ) => Ok(TransitionResult::new(ChatState::Idle {
            session: Session {
                session_id: session_id.clone(),
                brand_id: brand_id.clone(),
            },
        })
        .with_effect(Effect::post_bot(welcome_text(brand_id)))),

        // ============================================================
        // Message exchange
        // ============================================================
        (_, Event::UserMessage { text }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyInput)
        }

        (ChatState::Idle { session }, Event::UserMessage { text }) => {
            let message = text.trim().to_string();
            Ok(TransitionResult::new(ChatState::MessagePending {
                session: session.clone(),
            })
            .with_effects([
                Effect::post_user(message.clone()),
                Effect::ClearDraft,
                Effect::ShowTyping,
                Effect::SendChat {
                    session_id: session.session_id.clone(),
                    message,
                },
            ]))
        }

        (ChatState::MessagePending { .. }, Event::UserMessage { .. }) => {
            Err(TransitionError::ReplyPending)
        }

        (ChatState::SessionPending { .. }, Event::UserMessage { .. }) => {
            Err(TransitionError::SessionPending)
        }

        (ChatState::NoSession, Event::UserMessage { .. }) => Err(TransitionError::NoSession),

        (ChatState::MessagePending { session }, Event::ChatReply { text }) => {
            Ok(TransitionResult::new(ChatState::Idle {
                session: session.clone(),
            })
            .with_effects([Effect::HideTyping, Effect::post_bot(text)]))
        }

        (ChatState::MessagePending { session }, Event::ChatFailed { .. }) => {
            Ok(TransitionResult::new(ChatState::Idle {
                session: session.clone(),
            })
            .with_effects([Effect::HideTyping, Effect::post_bot(APOLOGY_TEXT)]))
        }

        // ============================================================
        // Reset
        // ============================================================
        (_, Event::Reset) => {
            Ok(TransitionResult::new(ChatState::NoSession).with_effect(Effect::ClearConversation))
        }

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} with event {event:?}",
            state.name()
        ))),
    }
}

fn begin_session(brand_id: String) -> TransitionResult {
    TransitionResult::new(ChatState::SessionPending {
        brand_id: brand_id.clone(),
        session_id: None,
    })
    .with_effect(Effect::CreateSession { brand_id })
}
