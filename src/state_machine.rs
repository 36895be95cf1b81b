//! Conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{ChatContext, ChatState, Connectivity, ConnectivityStatus, Phase, SessionContext};
pub use transition::{
    transition, TransitionError, TransitionResult, BACKEND_DOWN_MESSAGE, GENERIC_ERROR_PREFIX,
};
