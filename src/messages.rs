//! In-memory message list owned by the controller

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a message, unique and increasing within one list
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// A displayed chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    /// Synthetic bot message standing in for a failed exchange
    #[serde(default)]
    pub is_error: bool,
}

/// Append-only list of messages.
///
/// The welcome message is the only entry that may change after creation.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    next_id: u64,
    welcome: Option<MessageId>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, sender: Sender, text: impl Into<String>, is_error: bool) -> &Message {
        self.next_id += 1;
        self.messages.push(Message {
            id: MessageId(self.next_id),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            is_error,
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Append the empty bot message the welcome animation fills in.
    ///
    /// Returns `None` if a welcome message already exists.
    pub fn begin_welcome(&mut self) -> Option<&Message> {
        if self.welcome.is_some() {
            return None;
        }
        let id = self.append(Sender::Bot, String::new(), false).id;
        self.welcome = Some(id);
        self.messages.last()
    }

    /// Replace the welcome message text in place
    pub fn update_welcome(&mut self, text: impl Into<String>) -> Option<&Message> {
        let id = self.welcome?;
        let message = self.messages.iter_mut().find(|m| m.id == id)?;
        message.text = text.into();
        Some(message)
    }

    pub fn welcome_id(&self) -> Option<MessageId> {
        self.welcome
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
