//! Mock implementations for testing
//!
//! These mocks drive the controller without a backend.

use super::traits::*;
use super::{spawn_controller, ChatHandle, ChatView, Notice};
use crate::state_machine::ChatContext;
use crate::transport::{ChatReply, NewSession, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

// ============================================================================
// Mock Gateway
// ============================================================================

/// Mock gateway that returns queued responses
pub struct MockGateway {
    sessions: Mutex<VecDeque<Result<NewSession, TransportError>>>,
    replies: Mutex<VecDeque<Result<ChatReply, TransportError>>>,
    /// Brand ids of every session request
    pub session_requests: Mutex<Vec<String>>,
    /// `(session_id, message)` of every chat request
    pub chat_requests: Mutex<Vec<(String, String)>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(VecDeque::new()),
            replies: Mutex::new(VecDeque::new()),
            session_requests: Mutex::new(Vec::new()),
            chat_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_session(&self, session_id: &str) {
        self.sessions.lock().unwrap().push_back(Ok(NewSession {
            session_id: session_id.to_string(),
        }));
    }

    pub fn queue_session_error(&self, error: TransportError) {
        self.sessions.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_reply(&self, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(ChatReply::text(text)));
    }

    pub fn queue_reply_error(&self, error: TransportError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_sessions(&self) -> Vec<String> {
        self.session_requests.lock().unwrap().clone()
    }

    pub fn recorded_chats(&self) -> Vec<(String, String)> {
        self.chat_requests.lock().unwrap().clone()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportGateway for MockGateway {
    async fn create_session(&self, brand_id: &str) -> Result<NewSession, TransportError> {
        self.session_requests
            .lock()
            .unwrap()
            .push(brand_id.to_string());
        self.sessions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("No mock session queued")))
    }

    async fn send_chat_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatReply, TransportError> {
        self.chat_requests
            .lock()
            .unwrap()
            .push((session_id.to_string(), message.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("No mock reply queued")))
    }
}

// ============================================================================
// Delayed Mock Gateway (for pending-state testing)
// ============================================================================

/// Mock gateway whose chat replies arrive after a fixed delay
pub struct DelayedMockGateway {
    inner: MockGateway,
    delay: Duration,
}

impl DelayedMockGateway {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockGateway::new(),
            delay,
        }
    }

    pub fn queue_session(&self, session_id: &str) {
        self.inner.queue_session(session_id);
    }

    pub fn queue_reply(&self, text: &str) {
        self.inner.queue_reply(text);
    }

    pub fn recorded_chats(&self) -> Vec<(String, String)> {
        self.inner.recorded_chats()
    }
}

#[async_trait]
impl TransportGateway for DelayedMockGateway {
    async fn create_session(&self, brand_id: &str) -> Result<NewSession, TransportError> {
        self.inner.create_session(brand_id).await
    }

    async fn send_chat_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatReply, TransportError> {
        tokio::time::sleep(self.delay).await;
        self.inner.send_chat_message(session_id, message).await
    }
}

// ============================================================================
// Test Harness
// ============================================================================

/// Running controller plus the receivers a test needs
pub struct TestChat<G: TransportGateway + 'static> {
    pub handle: ChatHandle,
    pub gateway: Arc<G>,
    pub view_rx: watch::Receiver<ChatView>,
    pub notices: broadcast::Receiver<Notice>,
}

impl<G: TransportGateway + 'static> TestChat<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_context(ChatContext::new("acme"), gateway)
    }

    pub fn with_context(context: ChatContext, gateway: G) -> Self {
        let gateway = Arc::new(gateway);
        let handle = spawn_controller(context, gateway.clone());
        let view_rx = handle.subscribe();
        let notices = handle.notices();
        Self {
            handle,
            gateway,
            view_rx,
            notices,
        }
    }

    /// Wait until the published view satisfies `pred`
    pub async fn wait_for(
        &mut self,
        timeout: Duration,
        pred: impl FnMut(&ChatView) -> bool,
    ) -> bool {
        matches!(
            tokio::time::timeout(timeout, self.view_rx.wait_for(pred)).await,
            Ok(Ok(_))
        )
    }

    /// Wait for a specific state type
    pub async fn wait_for_state(&mut self, expected: &str, timeout: Duration) -> bool {
        self.wait_for(timeout, |view| view.state.name() == expected)
            .await
    }

    pub fn view(&self) -> ChatView {
        self.handle.view()
    }

    /// Open a session for "acme" and wait for the welcome
    pub async fn start(&mut self) {
        self.handle.start_session("acme").await.unwrap();
        assert!(self.wait_for_state("idle", Duration::from_secs(5)).await);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Node;
    use crate::runtime::ChatController;
    use crate::state_machine::transition::{welcome_text, APOLOGY_TEXT, CONNECT_FAILURE_TEXT};
    use crate::state_machine::{ChatState, Event, TransitionError};
    use crate::store::Role;
    use tokio::sync::broadcast::error::TryRecvError;
    use tokio::time::Instant;

    const WAIT: Duration = Duration::from_secs(5);

    fn entry_text(view: &ChatView, index: usize) -> String {
        view.entries[index]
            .formatted()
            .map(|f| f.plain_text())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_mock_gateway() {
        let gateway = MockGateway::new();
        gateway.queue_session("s1");
        gateway.queue_reply("hi");

        let session = gateway.create_session("acme").await.unwrap();
        assert_eq!(session.session_id, "s1");
        let reply = gateway.send_chat_message("s1", "hello").await.unwrap();
        assert_eq!(reply.text, "hi");

        // Exhausted queue fails
        assert!(gateway.send_chat_message("s1", "again").await.is_err());

        assert_eq!(gateway.recorded_sessions(), vec!["acme".to_string()]);
        assert_eq!(gateway.recorded_chats().len(), 2);
    }

    /// Session start waits out the welcome delay before becoming idle
    #[tokio::test(start_paused = true)]
    async fn test_session_start_posts_welcome_after_delay() {
        let gateway = MockGateway::new();
        gateway.queue_session("s1");
        let mut chat = TestChat::new(gateway);

        let started = Instant::now();
        chat.handle.start_session("acme").await.unwrap();
        assert!(chat.wait_for_state("idle", WAIT).await);
        assert!(started.elapsed() >= Duration::from_millis(500));

        let view = chat.view();
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].role, Role::Bot);
        assert_eq!(entry_text(&view, 0), welcome_text("acme"));
        assert_eq!(view.title, "Acme");
        assert_eq!(
            view.state.session().map(|s| s.session_id.as_str()),
            Some("s1")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_exchange() {
        let gateway = MockGateway::new();
        gateway.queue_session("s1");
        gateway.queue_reply("**Hi** there");
        let mut chat = TestChat::new(gateway);
        chat.start().await;

        chat.handle.send_message("  Hello  ").await.unwrap();
        assert!(chat.wait_for(WAIT, |v| v.count_role(Role::Bot) == 2).await);

        let view = chat.view();
        assert_eq!(view.state.name(), "idle");
        assert_eq!(view.entries.len(), 3);
        assert_eq!(view.entries[1].role, Role::User);
        assert_eq!(entry_text(&view, 1), "Hello");
        assert_eq!(
            view.entries[2].formatted().unwrap().nodes(),
            &[Node::bold("Hi"), Node::text(" there")]
        );
        assert!(!view.is_typing());
        assert_eq!(
            chat.gateway.recorded_chats(),
            vec![("s1".to_string(), "Hello".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_failure_reports_connectivity_error() {
        let gateway = MockGateway::new();
        gateway.queue_session_error(TransportError::network("connection refused"));
        let mut chat = TestChat::new(gateway);

        chat.handle.start_session("acme").await.unwrap();
        assert!(chat.wait_for(WAIT, |v| !v.entries.is_empty()).await);

        let view = chat.view();
        assert_eq!(view.state, ChatState::NoSession);
        assert_eq!(view.entries.len(), 1);
        assert_eq!(entry_text(&view, 0), CONNECT_FAILURE_TEXT);

        match chat.notices.recv().await.unwrap() {
            Notice::ConnectivityError { message } => {
                assert!(message.contains("connection refused"));
            }
            other => panic!("Expected ConnectivityError, got {other:?}"),
        }

        // Retry is an explicit new start
        chat.gateway.queue_session("s2");
        chat.handle.start_session("acme").await.unwrap();
        assert!(chat.wait_for_state("idle", WAIT).await);
        assert_eq!(chat.gateway.recorded_sessions().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chat_failure_posts_apology() {
        let gateway = MockGateway::new();
        gateway.queue_session("s1");
        gateway.queue_reply_error(TransportError::server_error("Backend returned 500"));
        let mut chat = TestChat::new(gateway);
        chat.start().await;

        chat.handle.send_message("Hello").await.unwrap();
        assert!(chat.wait_for(WAIT, |v| v.count_role(Role::Bot) == 2).await);

        let view = chat.view();
        assert_eq!(view.state.name(), "idle");
        assert_eq!(entry_text(&view, 2), APOLOGY_TEXT);
        assert!(!view.is_typing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_indicator_while_pending() {
        let gateway = DelayedMockGateway::new(Duration::from_secs(2));
        gateway.queue_session("s1");
        gateway.queue_reply("Done");
        let mut chat = TestChat::new(gateway);
        chat.start().await;

        chat.handle.send_message("Hello").await.unwrap();
        assert!(chat.wait_for_state("message_pending", WAIT).await);
        let view = chat.view();
        assert_eq!(view.count_role(Role::SystemTyping), 1);
        assert_eq!(view.entries.last().map(|e| e.role), Some(Role::SystemTyping));
        assert!(view.draft.is_empty());

        assert!(chat.wait_for_state("idle", WAIT).await);
        let view = chat.view();
        assert_eq!(view.count_role(Role::SystemTyping), 0);
        assert_eq!(entry_text(&view, view.entries.len() - 1), "Done");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_pending_is_rejected() {
        let gateway = DelayedMockGateway::new(Duration::from_secs(2));
        gateway.queue_session("s1");
        gateway.queue_reply("First reply");
        let mut chat = TestChat::new(gateway);
        chat.start().await;

        chat.handle.send_message("one").await.unwrap();
        assert!(chat.wait_for_state("message_pending", WAIT).await);
        chat.handle.send_message("two").await.unwrap();

        match chat.notices.recv().await.unwrap() {
            Notice::Rejected { reason } => {
                assert_eq!(reason, TransitionError::ReplyPending.to_string());
            }
            other => panic!("Expected Rejected, got {other:?}"),
        }

        assert!(chat.wait_for_state("idle", WAIT).await);
        let view = chat.view();
        assert_eq!(view.count_role(Role::User), 1);
        assert_eq!(chat.gateway.recorded_chats().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_late_reply() {
        let gateway = DelayedMockGateway::new(Duration::from_secs(2));
        gateway.queue_session("s1");
        gateway.queue_reply("Too late");
        let mut chat = TestChat::new(gateway);
        chat.start().await;

        chat.handle.send_message("Hello").await.unwrap();
        assert!(chat.wait_for_state("message_pending", WAIT).await);

        chat.handle.reset().await.unwrap();
        assert!(chat.wait_for_state("no_session", WAIT).await);
        assert!(chat.view().entries.is_empty());

        // Let the in-flight reply land
        tokio::time::sleep(Duration::from_secs(5)).await;
        chat.handle.set_draft("flush").await.unwrap();
        assert!(chat.wait_for(WAIT, |v| v.draft == "flush").await);

        let view = chat.view();
        assert_eq!(view.state, ChatState::NoSession);
        assert_eq!(view.count_role(Role::Bot), 0);
        assert!(!view.is_typing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_starts_session_once() {
        let gateway = MockGateway::new();
        gateway.queue_session("s1");
        let mut chat = TestChat::with_context(ChatContext::new("cristello"), gateway);
        assert!(!chat.view().visible);
        assert_eq!(chat.view().title, "Cristello");

        chat.handle.open().await.unwrap();
        assert!(chat.wait_for_state("idle", WAIT).await);
        assert!(chat.view().visible);

        chat.handle.close().await.unwrap();
        assert!(chat.wait_for(WAIT, |v| !v.visible).await);
        chat.handle.open().await.unwrap();
        assert!(chat.wait_for(WAIT, |v| v.visible).await);

        assert_eq!(chat.view().state.name(), "idle");
        assert_eq!(chat.view().count_role(Role::Bot), 1);
        assert_eq!(chat.gateway.recorded_sessions(), vec!["cristello".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_message_is_ignored_silently() {
        let gateway = MockGateway::new();
        gateway.queue_session("s1");
        let mut chat = TestChat::new(gateway);
        chat.start().await;

        chat.handle.set_draft("   ").await.unwrap();
        chat.handle.send_message("   ").await.unwrap();
        chat.handle.set_draft("next").await.unwrap();
        assert!(chat.wait_for(WAIT, |v| v.draft == "next").await);

        assert!(matches!(chat.notices.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(chat.view().entries.len(), 1);
        assert!(chat.gateway.recorded_chats().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_controller_step_by_step() {
        let gateway = MockGateway::new();
        gateway.queue_session("s1");
        let (mut controller, _handle) = ChatController::new(ChatContext::new("acme"), gateway);

        controller
            .dispatch(Event::StartSession {
                brand_id: "acme".to_string(),
            })
            .unwrap();
        assert_eq!(controller.state().name(), "session_pending");
        assert_eq!(
            controller.dispatch(Event::StartSession {
                brand_id: "acme".to_string(),
            }),
            Err(TransitionError::SessionPending)
        );

        // Session created, welcome scheduled
        assert!(controller.step().await);
        assert_eq!(
            controller.state(),
            &ChatState::SessionPending {
                brand_id: "acme".to_string(),
                session_id: Some("s1".to_string()),
            }
        );
        assert!(controller.store().is_empty());

        // Welcome due
        assert!(controller.step().await);
        assert!(controller.state().is_idle());
        assert_eq!(controller.store().len(), 1);

        controller
            .dispatch(Event::DraftChanged {
                text: "typing".to_string(),
            })
            .unwrap();
        assert_eq!(controller.draft(), "typing");
        controller.dispatch(Event::Open).unwrap();
        assert!(controller.is_visible());
    }
}
