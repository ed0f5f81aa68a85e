//! Runtime for driving a chat conversation
//!
//! A single [`ChatController`] task owns the conversation. Callers talk to it
//! through a cloneable [`ChatHandle`]; the rendered conversation comes back
//! on a `watch` channel and user-facing notices on a `broadcast` channel.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ChatController;
pub use traits::*;

use crate::state_machine::{ChatContext, ChatState, Event};
use crate::store::{MessageEntry, Role};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};

/// Everything the view layer needs to draw the widget
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatView {
    pub state: ChatState,
    /// Header title, the brand name capitalised
    pub title: String,
    pub visible: bool,
    /// Contents of the input box
    pub draft: String,
    pub entries: Vec<MessageEntry>,
}

impl ChatView {
    pub fn is_typing(&self) -> bool {
        self.entries.iter().any(MessageEntry::is_typing)
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.entries.iter().filter(|entry| entry.role == role).count()
    }
}

/// Out-of-band messages for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// An operation was refused in the current state
    Rejected { reason: String },
    /// The backend could not be reached while starting a session
    ConnectivityError { message: String },
}

/// Message delivered to the controller loop
#[derive(Debug)]
pub(crate) enum Inbound {
    /// Caller-originated event
    Command(Event),
    /// Result of background work started during `epoch`
    Completion { epoch: u64, event: Event },
}

#[derive(Debug, Error)]
pub enum HandleError {
    #[error("Chat controller has stopped")]
    Stopped,
}

/// Caller-facing handle to a running controller
#[derive(Clone)]
pub struct ChatHandle {
    inbound_tx: mpsc::Sender<Inbound>,
    view_rx: watch::Receiver<ChatView>,
    notice_tx: broadcast::Sender<Notice>,
}

impl ChatHandle {
    async fn send(&self, event: Event) -> Result<(), HandleError> {
        self.inbound_tx
            .send(Inbound::Command(event))
            .await
            .map_err(|_| HandleError::Stopped)
    }

    pub async fn start_session(&self, brand_id: impl Into<String>) -> Result<(), HandleError> {
        self.send(Event::StartSession {
            brand_id: brand_id.into(),
        })
        .await
    }

    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), HandleError> {
        self.send(Event::UserMessage { text: text.into() }).await
    }

    /// End the conversation: clears the session and the message log
    pub async fn reset(&self) -> Result<(), HandleError> {
        self.send(Event::Reset).await
    }

    /// Show the widget, starting a session on first open
    pub async fn open(&self) -> Result<(), HandleError> {
        self.send(Event::Open).await
    }

    /// Hide the widget, keeping the session
    pub async fn close(&self) -> Result<(), HandleError> {
        self.send(Event::Close).await
    }

    pub async fn set_draft(&self, text: impl Into<String>) -> Result<(), HandleError> {
        self.send(Event::DraftChanged { text: text.into() }).await
    }

    /// Latest published view
    pub fn view(&self) -> ChatView {
        self.view_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatView> {
        self.view_rx.clone()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notice_tx.subscribe()
    }
}

/// Start a controller task and return its handle
///
/// The task stops once every handle and view subscriber is dropped.
pub fn spawn_controller<G: TransportGateway + 'static>(
    context: ChatContext,
    gateway: G,
) -> ChatHandle {
    let (controller, handle) = ChatController::new(context, gateway);
    tokio::spawn(controller.run());
    handle
}

/// Header title for a brand id
pub fn brand_title(brand_id: &str) -> String {
    let mut chars = brand_id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
