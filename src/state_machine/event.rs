//! Events that drive the controller

use crate::transport::{ChatReply, HealthReport};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Lifecycle
    Mounted,
    WelcomeTick,

    // User events
    UserSubmit { text: String },
    /// Manual status refresh, also used by the periodic poll
    RefreshStatus,

    // Transport events
    SendSucceeded { reply: ChatReply },
    SendFailed { message: String },
    HealthChecked { report: HealthReport },
}

impl Event {
    pub fn user_submit(text: impl Into<String>) -> Self {
        Event::UserSubmit { text: text.into() }
    }
}
