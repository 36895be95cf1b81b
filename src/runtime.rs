//! Runtime for driving a chat controller
//!
//! The controller task owns all conversation state. Front ends talk to it
//! through a [`ControllerHandle`]: events go in over an mpsc channel, view
//! updates come out over a broadcast channel, and the latest full view is
//! always readable from a watch channel.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::ChatController;

use crate::messages::Message;
use crate::state_machine::{ConnectivityStatus, Event, Phase};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Incremental updates for the view
#[derive(Debug, Clone)]
pub enum ViewEvent {
    MessageAppended { message: Message },
    /// The welcome message grew by one character
    MessageUpdated { message: Message },
    StatusChanged { status: ConnectivityStatus },
    InputEnabled { enabled: bool },
    InputCleared,
    /// An event was refused (busy, empty input, still welcoming)
    Rejected { reason: String },
}

/// Full view of the controller after the last processed event
#[derive(Debug, Clone, Default)]
pub struct ChatSnapshot {
    pub phase: Phase,
    pub connectivity: ConnectivityStatus,
    pub session_id: Option<String>,
    pub messages: Vec<Message>,
}

impl ChatSnapshot {
    pub fn input_enabled(&self) -> bool {
        self.phase.accepts_input()
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Controller has stopped")]
    Closed,
}

/// Handle to interact with a running controller
#[derive(Clone)]
pub struct ControllerHandle {
    event_tx: mpsc::Sender<Event>,
    view_tx: broadcast::Sender<ViewEvent>,
    snapshot_rx: watch::Receiver<ChatSnapshot>,
    shutdown: CancellationToken,
}

impl ControllerHandle {
    /// Submit what the user typed
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), ControllerError> {
        self.send(Event::user_submit(text)).await
    }

    /// Re-check connectivity now
    pub async fn refresh_status(&self) -> Result<(), ControllerError> {
        self.send(Event::RefreshStatus).await
    }

    async fn send(&self, event: Event) -> Result<(), ControllerError> {
        if self.shutdown.is_cancelled() {
            return Err(ControllerError::Closed);
        }
        self.event_tx
            .send(event)
            .await
            .map_err(|_| ControllerError::Closed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.view_tx.subscribe()
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Stop the controller and any pending timers
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
