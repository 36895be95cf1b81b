//! Widget configuration from the environment

use crate::state_machine::state::{DEFAULT_WELCOME_DELAY, DEFAULT_WELCOME_INTERVAL};
use crate::state_machine::ChatContext;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const DEFAULT_WELCOME_TEXT: &str = "Welcome to AayushBot 2.0! Your intelligent AI assistant \
                                        is ready to help you with anything you need.";

/// Configuration for one chat widget
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Base URL of the chat service, without the `/chat` suffix
    pub base_url: String,
    pub welcome_text: String,
    pub welcome_delay: Duration,
    pub welcome_interval: Duration,
    /// Periodic connectivity re-check, off when `None`
    pub health_poll_interval: Option<Duration>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            welcome_text: DEFAULT_WELCOME_TEXT.to_string(),
            welcome_delay: DEFAULT_WELCOME_DELAY,
            welcome_interval: DEFAULT_WELCOME_INTERVAL,
            health_poll_interval: None,
        }
    }
}

impl WidgetConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| {
            parse_number(key, lookup(key)).map_or(default, Duration::from_millis)
        };

        Self {
            base_url: lookup("CHAT_API_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.base_url),
            welcome_text: lookup("CHAT_WELCOME_TEXT").unwrap_or(defaults.welcome_text),
            welcome_delay: millis("CHAT_WELCOME_DELAY_MS", defaults.welcome_delay),
            welcome_interval: millis("CHAT_WELCOME_INTERVAL_MS", defaults.welcome_interval),
            health_poll_interval: parse_number("CHAT_HEALTH_POLL_SECS", lookup("CHAT_HEALTH_POLL_SECS"))
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    pub fn context(&self) -> ChatContext {
        ChatContext::new(&self.welcome_text).with_timing(self.welcome_delay, self.welcome_interval)
    }
}

fn parse_number(key: &str, value: Option<String>) -> Option<u64> {
    let value = value?;
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!(key, value = %value, "Ignoring invalid number, using default");
            None
        }
    }
}
