//! Pure state transition function

use super::{ChatContext, ChatState, ConnectivityStatus, Effect, Event, Phase};
use crate::state_machine::state::Connectivity;
use crate::transport::HealthReport;
use thiserror::Error;

/// Shown when a send fails while the service was already believed offline
pub const BACKEND_DOWN_MESSAGE: &str =
    "The backend seems to be down right now. Please try again in a little while.";

/// Prefix of the error bubble for any other send failure
pub const GENERIC_ERROR_PREFIX: &str = "Sorry, something went wrong: ";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Events the controller refuses in its current phase
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Still showing the welcome message, input is not open yet")]
    Welcoming,
    #[error("A message is already being sent")]
    Busy,
    #[error("Message is empty")]
    EmptyInput,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; all I/O is
/// described by the returned effects.
pub fn transition(
    state: &ChatState,
    context: &ChatContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state.phase, event) {
        // ============================================================
        // Mount and welcome animation
        // ============================================================
        (Phase::Welcoming { revealed: 0 }, Event::Mounted) => {
            let new_state = ChatState {
                connectivity: ConnectivityStatus::checking(),
                ..state.clone()
            };
            Ok(TransitionResult::new(new_state).with_effects([
                Effect::BeginWelcome,
                Effect::disable_input(),
                Effect::PublishStatus,
                Effect::CheckHealth,
                Effect::ScheduleWelcomeTick {
                    delay: context.welcome_delay,
                },
            ]))
        }

        (_, Event::Mounted) => Err(TransitionError::InvalidTransition(
            "controller is already mounted".to_string(),
        )),

        (Phase::Welcoming { revealed }, Event::WelcomeTick) => {
            let total = context.welcome_len();
            if revealed >= total {
                // Nothing left to show (empty welcome text)
                return Ok(finish_welcome(state));
            }

            let revealed = revealed + 1;
            let update = Effect::UpdateWelcome {
                text: context.welcome_prefix(revealed),
            };
            if revealed == total {
                let new_state = ChatState {
                    phase: Phase::Idle,
                    ..state.clone()
                };
                return Ok(TransitionResult::new(new_state)
                    .with_effect(update)
                    .with_effect(Effect::enable_input()));
            }

            let new_state = ChatState {
                phase: Phase::Welcoming { revealed },
                ..state.clone()
            };
            Ok(TransitionResult::new(new_state)
                .with_effect(update)
                .with_effect(Effect::ScheduleWelcomeTick {
                    delay: context.welcome_interval,
                }))
        }

        (_, Event::WelcomeTick) => Err(TransitionError::InvalidTransition(
            "welcome animation already finished".to_string(),
        )),

        // ============================================================
        // User message handling
        // ============================================================
        (Phase::Welcoming { .. }, Event::UserSubmit { .. }) => Err(TransitionError::Welcoming),

        (Phase::Sending, Event::UserSubmit { .. }) => Err(TransitionError::Busy),

        (Phase::Idle, Event::UserSubmit { text }) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(TransitionError::EmptyInput);
            }

            let new_state = ChatState {
                phase: Phase::Sending,
                ..state.clone()
            };
            Ok(TransitionResult::new(new_state).with_effects([
                Effect::user_message(text),
                Effect::ClearInput,
                Effect::disable_input(),
                Effect::SendMessage {
                    text: text.to_string(),
                    session_id: state.session.id().map(str::to_string),
                },
            ]))
        }

        // ============================================================
        // Send outcome
        // ============================================================
        (Phase::Sending, Event::SendSucceeded { reply }) => {
            let mut session = state.session.clone();
            session.absorb(reply.session_id);

            let new_state = ChatState {
                phase: Phase::Idle,
                // A successful exchange implies reachability
                connectivity: ConnectivityStatus::online(state.connectivity.latency),
                session,
            };
            Ok(TransitionResult::new(new_state).with_effects([
                Effect::bot_message(reply.answer),
                Effect::PublishStatus,
                Effect::enable_input(),
            ]))
        }

        (Phase::Sending, Event::SendFailed { message }) => {
            // Message choice reads the status from before this failure
            let text = if state.connectivity.state == Connectivity::Offline {
                BACKEND_DOWN_MESSAGE.to_string()
            } else {
                format!("{GENERIC_ERROR_PREFIX}{message}")
            };

            let new_state = ChatState {
                phase: Phase::Idle,
                connectivity: ConnectivityStatus::offline(),
                ..state.clone()
            };
            Ok(TransitionResult::new(new_state).with_effects([
                Effect::bot_error(text),
                Effect::PublishStatus,
                Effect::enable_input(),
            ]))
        }

        (phase, Event::SendSucceeded { .. } | Event::SendFailed { .. }) => {
            Err(TransitionError::InvalidTransition(format!(
                "send outcome received while {phase:?}"
            )))
        }

        // ============================================================
        // Connectivity (any phase)
        // ============================================================
        (_, Event::RefreshStatus) => {
            let new_state = ChatState {
                connectivity: ConnectivityStatus::checking(),
                ..state.clone()
            };
            Ok(TransitionResult::new(new_state)
                .with_effect(Effect::PublishStatus)
                .with_effect(Effect::CheckHealth))
        }

        (_, Event::HealthChecked { report }) => {
            let new_state = ChatState {
                connectivity: status_from_report(report),
                ..state.clone()
            };
            Ok(TransitionResult::new(new_state).with_effect(Effect::PublishStatus))
        }
    }
}

fn finish_welcome(state: &ChatState) -> TransitionResult {
    let new_state = ChatState {
        phase: Phase::Idle,
        ..state.clone()
    };
    TransitionResult::new(new_state).with_effect(Effect::enable_input())
}

fn status_from_report(report: HealthReport) -> ConnectivityStatus {
    if report.reachable {
        ConnectivityStatus::online(report.latency)
    } else {
        ConnectivityStatus::offline()
    }
}
