//! Effects produced by state transitions

use crate::messages::Sender;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the list
    AppendMessage {
        sender: Sender,
        text: String,
        is_error: bool,
    },

    /// Append the empty welcome message
    BeginWelcome,

    /// Replace the welcome message text
    UpdateWelcome { text: String },

    /// Post a `WelcomeTick` after `delay`
    ScheduleWelcomeTick { delay: Duration },

    /// Probe the chat service
    CheckHealth,

    /// Send a chat request (spawns as background task)
    SendMessage {
        text: String,
        session_id: Option<String>,
    },

    /// Tell the view the connectivity status changed
    PublishStatus,

    /// Tell the view to clear the input field
    ClearInput,

    /// Tell the view to enable or disable the input field
    SetInputEnabled { enabled: bool },
}

impl Effect {
    pub fn user_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::User,
            text: text.into(),
            is_error: false,
        }
    }

    pub fn bot_message(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::Bot,
            text: text.into(),
            is_error: false,
        }
    }

    pub fn bot_error(text: impl Into<String>) -> Self {
        Effect::AppendMessage {
            sender: Sender::Bot,
            text: text.into(),
            is_error: true,
        }
    }

    pub fn enable_input() -> Self {
        Effect::SetInputEnabled { enabled: true }
    }

    pub fn disable_input() -> Self {
        Effect::SetInputEnabled { enabled: false }
    }
}
