//! Chat controller executor

use super::{ChatSnapshot, ControllerHandle, ViewEvent};
use crate::messages::MessageLog;
use crate::state_machine::{transition, ChatContext, ChatState, Effect, Event, TransitionError};
use crate::transport::ChatTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Controller that works with any transport implementation
pub struct ChatController<T>
where
    T: ChatTransport + 'static,
{
    context: ChatContext,
    state: ChatState,
    log: MessageLog,
    transport: Arc<T>,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    view_tx: broadcast::Sender<ViewEvent>,
    snapshot_tx: watch::Sender<ChatSnapshot>,
    /// Stops the event loop and every pending timer
    shutdown: CancellationToken,
    health_poll: Option<Duration>,
}

impl<T> ChatController<T>
where
    T: ChatTransport + 'static,
{
    pub fn new(context: ChatContext, transport: T) -> (Self, ControllerHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let (view_tx, _) = broadcast::channel(256);
        let (snapshot_tx, snapshot_rx) = watch::channel(ChatSnapshot::default());
        let shutdown = CancellationToken::new();

        let handle = ControllerHandle {
            event_tx: event_tx.clone(),
            view_tx: view_tx.clone(),
            snapshot_rx,
            shutdown: shutdown.clone(),
        };

        let controller = Self {
            context,
            state: ChatState::default(),
            log: MessageLog::new(),
            transport: Arc::new(transport),
            event_rx,
            event_tx,
            view_tx,
            snapshot_tx,
            shutdown,
            health_poll: None,
        };

        (controller, handle)
    }

    /// Re-check connectivity every `period` in addition to the check on mount
    pub fn with_health_poll(mut self, period: Duration) -> Self {
        self.health_poll = Some(period);
        self
    }

    /// Start the controller on the current tokio runtime
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        tracing::info!(welcome_chars = self.context.welcome_len(), "Starting chat controller");

        if let Err(e) = self.process_event(Event::Mounted) {
            tracing::error!(error = %e, "Failed to mount controller");
        }

        if let Some(period) = self.health_poll {
            self.spawn_health_poll(period);
        }

        // Process events in a loop until shut down
        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => break,

                event = self.event_rx.recv() => {
                    let Some(event) = event else { break };
                    if let Err(e) = self.process_event(event) {
                        tracing::debug!(error = %e, "Event rejected");
                    }
                }
            }
        }

        self.shutdown.cancel();
        tracing::info!(messages = self.log.len(), "Chat controller stopped");
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                // Rejections are user-facing (e.g. "already sending")
                let _ = self.view_tx.send(ViewEvent::Rejected {
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        self.state = result.new_state;
        for effect in result.effects {
            self.execute_effect(effect);
        }

        self.snapshot_tx.send_replace(self.snapshot());
        Ok(())
    }

    fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            phase: self.state.phase,
            connectivity: self.state.connectivity,
            session_id: self.state.session.id().map(str::to_string),
            messages: self.log.messages().to_vec(),
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendMessage {
                sender,
                text,
                is_error,
            } => {
                let message = self.log.append(sender, text, is_error).clone();
                tracing::debug!(id = %message.id, sender = ?message.sender, is_error, "Message appended");
                let _ = self.view_tx.send(ViewEvent::MessageAppended { message });
            }

            Effect::BeginWelcome => {
                if let Some(message) = self.log.begin_welcome() {
                    let message = message.clone();
                    let _ = self.view_tx.send(ViewEvent::MessageAppended { message });
                }
            }

            Effect::UpdateWelcome { text } => {
                if let Some(message) = self.log.update_welcome(text) {
                    let message = message.clone();
                    let _ = self.view_tx.send(ViewEvent::MessageUpdated { message });
                }
            }

            Effect::ScheduleWelcomeTick { delay } => {
                let event_tx = self.event_tx.clone();
                let shutdown = self.shutdown.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        () = shutdown.cancelled() => {}
                        () = tokio::time::sleep(delay) => {
                            let _ = event_tx.send(Event::WelcomeTick).await;
                        }
                    }
                });
            }

            Effect::CheckHealth => {
                let transport = self.transport.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let report = transport.check_health().await;
                    let _ = event_tx.send(Event::HealthChecked { report }).await;
                });
            }

            Effect::SendMessage { text, session_id } => {
                // Runs to completion; the Sending phase keeps it the only one
                let transport = self.transport.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let event = match transport.send_message(&text, session_id.as_deref()).await {
                        Ok(reply) => Event::SendSucceeded { reply },
                        Err(e) => Event::SendFailed {
                            message: e.to_string(),
                        },
                    };
                    let _ = event_tx.send(event).await;
                });
            }

            Effect::PublishStatus => {
                let status = self.state.connectivity;
                tracing::debug!(%status, "Connectivity changed");
                let _ = self.view_tx.send(ViewEvent::StatusChanged { status });
            }

            Effect::ClearInput => {
                let _ = self.view_tx.send(ViewEvent::InputCleared);
            }

            Effect::SetInputEnabled { enabled } => {
                let _ = self.view_tx.send(ViewEvent::InputEnabled { enabled });
            }
        }
    }

    fn spawn_health_poll(&self, period: Duration) {
        let event_tx = self.event_tx.clone();
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick fires immediately; mount already checked
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        if event_tx.send(Event::RefreshStatus).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }
}
