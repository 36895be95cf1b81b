//! Chat widget client core
//!
//! A conversation controller that streams a scripted welcome message,
//! forwards user messages to a remote chat service over HTTP, and tracks
//! whether that service is reachable.

pub mod config;
pub mod messages;
pub mod runtime;
pub mod state_machine;
pub mod transport;

pub use config::WidgetConfig;
pub use runtime::{ChatController, ChatSnapshot, ControllerError, ControllerHandle, ViewEvent};
pub use transport::{ChatTransport, HttpTransport, LoggingTransport};
