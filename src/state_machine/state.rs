//! Controller state types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default delay before the first welcome character appears
pub const DEFAULT_WELCOME_DELAY: Duration = Duration::from_millis(1000);

/// Default delay between two welcome characters
pub const DEFAULT_WELCOME_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// Phase
// ============================================================================

/// Where the controller is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// Welcome text is being revealed; input is disabled
    Welcoming {
        /// Number of characters shown so far
        revealed: usize,
    },

    /// Ready for user input
    Idle,

    /// A chat request is in flight
    Sending,
}

impl Default for Phase {
    fn default() -> Self {
        Phase::Welcoming { revealed: 0 }
    }
}

impl Phase {
    pub fn accepts_input(self) -> bool {
        matches!(self, Phase::Idle)
    }
}

// ============================================================================
// Connectivity
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    #[default]
    Checking,
    Online,
    Offline,
}

/// Client-side belief about whether the chat service is reachable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConnectivityStatus {
    pub state: Connectivity,
    /// Round trip of the last successful health check
    pub latency: Option<Duration>,
}

impl ConnectivityStatus {
    pub fn checking() -> Self {
        Self {
            state: Connectivity::Checking,
            latency: None,
        }
    }

    pub fn online(latency: Option<Duration>) -> Self {
        Self {
            state: Connectivity::Online,
            latency,
        }
    }

    pub fn offline() -> Self {
        Self {
            state: Connectivity::Offline,
            latency: None,
        }
    }
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.state, self.latency) {
            (Connectivity::Checking, _) => write!(f, "checking"),
            (Connectivity::Online, Some(latency)) => write!(f, "online ({} ms)", latency.as_millis()),
            (Connectivity::Online, None) => write!(f, "online"),
            (Connectivity::Offline, _) => write!(f, "offline"),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Session identifier issued by the chat service.
///
/// Set at most once; later identifiers are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionContext(Option<String>);

impl SessionContext {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Take `candidate` if no identifier is held yet. Returns whether it was taken.
    pub fn absorb(&mut self, candidate: Option<String>) -> bool {
        if self.0.is_some() {
            return false;
        }
        match candidate {
            Some(id) => {
                self.0 = Some(id);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// Controller State
// ============================================================================

/// Mutable state the transition function works on
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatState {
    pub phase: Phase,
    pub connectivity: ConnectivityStatus,
    pub session: SessionContext,
}

/// Immutable configuration of one controller
#[derive(Debug, Clone)]
pub struct ChatContext {
    welcome: Vec<char>,
    pub welcome_delay: Duration,
    pub welcome_interval: Duration,
}

impl ChatContext {
    pub fn new(welcome_text: &str) -> Self {
        Self {
            welcome: welcome_text.chars().collect(),
            welcome_delay: DEFAULT_WELCOME_DELAY,
            welcome_interval: DEFAULT_WELCOME_INTERVAL,
        }
    }

    pub fn with_timing(mut self, delay: Duration, interval: Duration) -> Self {
        self.welcome_delay = delay;
        self.welcome_interval = interval;
        self
    }

    /// Welcome length in characters
    pub fn welcome_len(&self) -> usize {
        self.welcome.len()
    }

    pub fn welcome_text(&self) -> String {
        self.welcome.iter().collect()
    }

    /// First `count` characters of the welcome text
    pub fn welcome_prefix(&self, count: usize) -> String {
        self.welcome.iter().take(count).collect()
    }
}
