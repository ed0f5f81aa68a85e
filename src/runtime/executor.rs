//! Conversation controller

use super::traits::TransportGateway;
use super::{brand_title, ChatHandle, ChatView, Inbound, Notice};

use crate::state_machine::{transition, ChatContext, ChatState, Effect, Event, TransitionError};
use crate::store::{MessageId, MessageStore, NewMessage};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Owns one conversation and executes the effects of its state machine
///
/// Requests to the gateway and the welcome delay run as spawned tasks; each
/// one posts exactly one completion back to the controller's queue, so every
/// state change happens on the controller's own task.
pub struct ChatController<G>
where
    G: TransportGateway + 'static,
{
    context: ChatContext,
    state: ChatState,
    store: MessageStore,
    draft: String,
    visible: bool,
    /// Typing indicator currently shown, removed exactly once
    typing_id: Option<MessageId>,
    /// Bumped on reset; completions from older epochs are dropped
    epoch: u64,
    gateway: Arc<G>,
    inbound_rx: mpsc::Receiver<Inbound>,
    inbound_tx: mpsc::Sender<Inbound>,
    view_tx: watch::Sender<ChatView>,
    notice_tx: broadcast::Sender<Notice>,
}

impl<G> ChatController<G>
where
    G: TransportGateway + 'static,
{
    pub fn new(context: ChatContext, gateway: G) -> (Self, ChatHandle) {
        let (inbound_tx, inbound_rx) = mpsc::channel(32);
        let (notice_tx, _) = broadcast::channel(32);
        let initial = ChatView {
            title: brand_title(&context.default_brand_id),
            ..ChatView::default()
        };
        let (view_tx, view_rx) = watch::channel(initial);

        let handle = ChatHandle {
            inbound_tx: inbound_tx.clone(),
            view_rx,
            notice_tx: notice_tx.clone(),
        };

        let controller = Self {
            context,
            state: ChatState::NoSession,
            store: MessageStore::new(),
            draft: String::new(),
            visible: false,
            typing_id: None,
            epoch: 0,
            gateway: Arc::new(gateway),
            inbound_rx,
            inbound_tx,
            view_tx,
            notice_tx,
        };
        (controller, handle)
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub async fn run(mut self) {
        tracing::info!(brand = %self.context.default_brand_id, "Starting chat controller");

        loop {
            tokio::select! {
                Some(inbound) = self.inbound_rx.recv() => self.handle_inbound(inbound),
                () = self.view_tx.closed() => break,
            }
        }

        tracing::info!("Chat controller stopped");
    }

    /// Process the next queued command or completion
    ///
    /// Returns `false` if the queue is closed.
    pub async fn step(&mut self) -> bool {
        match self.inbound_rx.recv().await {
            Some(inbound) => {
                self.handle_inbound(inbound);
                true
            }
            None => false,
        }
    }

    /// Apply a caller event immediately
    pub fn dispatch(&mut self, event: Event) -> Result<(), TransitionError> {
        self.process_event(event)
    }

    fn handle_inbound(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Command(event) => {
                // Rejections are already logged and broadcast
                let _ = self.process_event(event);
            }
            Inbound::Completion { epoch, event } if epoch == self.epoch => {
                let _ = self.process_event(event);
            }
            Inbound::Completion { epoch, event } => {
                tracing::debug!(
                    epoch,
                    current_epoch = self.epoch,
                    ?event,
                    "Discarding completion from before reset"
                );
            }
        }
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let is_completion = event.is_completion();

        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                if e.is_silent() {
                    tracing::debug!(error = %e, "Ignoring event");
                } else if is_completion {
                    tracing::warn!(error = %e, state = self.state.name(), "Unexpected completion");
                } else {
                    tracing::info!(error = %e, state = self.state.name(), "Rejected event");
                    let _ = self.notice_tx.send(Notice::Rejected {
                        reason: e.to_string(),
                    });
                }
                return Err(e);
            }
        };

        let old_state = std::mem::replace(&mut self.state, result.new_state);
        if old_state.name() != self.state.name() {
            tracing::debug!(from = old_state.name(), to = self.state.name(), "State change");
        }

        for effect in result.effects {
            self.execute_effect(effect);
        }

        self.publish();
        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::PostMessage { role, text } => {
                let id = self.store.append(NewMessage::formatted(role, text));
                tracing::debug!(%id, ?role, "Appended message");
            }

            Effect::ShowTyping => {
                if let Some(stale) = self.typing_id.take() {
                    tracing::warn!(
                        id = %stale,
                        "Replacing typing indicator that was never removed"
                    );
                    self.store.remove(stale);
                }
                self.typing_id = Some(self.store.append(NewMessage::typing()));
            }

            Effect::HideTyping => {
                if let Some(id) = self.typing_id.take() {
                    self.store.remove(id);
                }
            }

            Effect::ClearDraft => self.draft.clear(),

            Effect::SetDraft { text } => self.draft = text,

            Effect::ShowWidget => self.visible = true,

            Effect::HideWidget => self.visible = false,

            Effect::CreateSession { brand_id } => {
                let gateway = self.gateway.clone();
                self.spawn_completion(async move {
                    tracing::info!(brand = %brand_id, "Creating session");
                    match gateway.create_session(&brand_id).await {
                        Ok(session) => Event::SessionCreated {
                            session_id: session.session_id,
                        },
                        Err(e) => {
                            tracing::error!(
                                brand = %brand_id,
                                error = %e,
                                "Session creation failed"
                            );
                            Event::SessionFailed {
                                message: e.to_string(),
                            }
                        }
                    }
                });
            }

            Effect::ScheduleWelcome { delay } => {
                self.spawn_completion(async move {
                    tokio::time::sleep(delay).await;
                    Event::WelcomeDue
                });
            }

            Effect::SendChat {
                session_id,
                message,
            } => {
                let gateway = self.gateway.clone();
                self.spawn_completion(async move {
                    match gateway.send_chat_message(&session_id, &message).await {
                        Ok(reply) => Event::ChatReply { text: reply.text },
                        Err(e) => {
                            tracing::error!(
                                session_id = %session_id,
                                error = %e,
                                "Chat request failed"
                            );
                            Event::ChatFailed {
                                message: e.to_string(),
                            }
                        }
                    }
                });
            }

            Effect::ReportConnectivityError { message } => {
                let _ = self
                    .notice_tx
                    .send(Notice::ConnectivityError { message });
            }

            Effect::ClearConversation => {
                self.store.clear();
                self.typing_id = None;
                self.draft.clear();
                self.epoch += 1;
                tracing::info!(epoch = self.epoch, "Conversation reset");
            }
        }
    }

    /// Run `work` in the background and queue its event as a completion
    fn spawn_completion<F>(&self, work: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let inbound_tx = self.inbound_tx.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let event = work.await;
            if inbound_tx
                .send(Inbound::Completion { epoch, event })
                .await
                .is_err()
            {
                tracing::debug!("Controller gone, dropping completion");
            }
        });
    }

    fn view(&self) -> ChatView {
        let brand = self
            .state
            .brand_id()
            .unwrap_or(&self.context.default_brand_id);
        ChatView {
            state: self.state.clone(),
            title: brand_title(brand),
            visible: self.visible,
            draft: self.draft.clone(),
            entries: self.store.snapshot().to_vec(),
        }
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.view());
    }
}
