//! Listening session state machine
//!
//! One session covers greeting, the pre-listening pause, a single capture
//! attempt and the dispatch of its result. Transitions not listed in
//! [`ListeningSession::advance`] are rejected, so a transcript can only be
//! produced from a live capture and never after an error.

use std::fmt;

use serde::Serialize;

use crate::intent::Transcript;
use crate::{Error, Result};

/// Where a session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// Waiting for the user to start a session
    Idle,
    /// Greeting spoken, waiting out the pre-listening delay
    AwaitingStart,
    /// Capture in progress
    Listening,
    /// Capture stopped, handling the transcript
    Dispatching,
}

/// Inputs that move a session between states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// User started a session
    Activated,
    /// Pre-listening delay elapsed
    DelayElapsed,
    /// Recognizer delivered a transcript
    Result,
    /// Recognizer reported an error
    Error,
    /// Capture ended without result or error
    Cancelled,
    /// Dispatch finished
    Dispatched,
}

/// UI-facing status notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusSignal {
    /// Capture began
    ListeningStarted,
    /// Capture ended, for any reason
    ListeningEnded,
}

impl fmt::Display for StatusSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListeningStarted => write!(f, "listening-started"),
            Self::ListeningEnded => write!(f, "listening-ended"),
        }
    }
}

/// A single accepted transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the event
    pub from: SessionState,
    /// State after the event
    pub to: SessionState,
    /// Status change to publish, if capture started or ended
    pub signal: Option<StatusSignal>,
}

/// Short-lived listening session
#[derive(Debug)]
pub struct ListeningSession {
    state: SessionState,
}

impl Default for ListeningSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ListeningSession {
    /// Create an idle session
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Apply `event`
    ///
    /// # Errors
    ///
    /// Returns `Error::Session` if `event` is not valid in the current state;
    /// the state is left unchanged
    pub fn advance(&mut self, event: SessionEvent) -> Result<Transition> {
        use SessionEvent as E;
        use SessionState as S;

        let to = match (self.state, event) {
            (S::Idle, E::Activated) => S::AwaitingStart,
            (S::AwaitingStart, E::DelayElapsed) => S::Listening,
            (S::Listening, E::Result) => S::Dispatching,
            (S::Listening, E::Error | E::Cancelled) | (S::Dispatching, E::Dispatched) => S::Idle,
            (from, event) => {
                return Err(Error::Session(format!(
                    "{event:?} not allowed while {from:?}"
                )));
            }
        };

        let from = self.state;
        let signal = match (from, to) {
            (_, S::Listening) => Some(StatusSignal::ListeningStarted),
            (S::Listening, _) => Some(StatusSignal::ListeningEnded),
            _ => None,
        };

        tracing::trace!(?from, ?to, ?event, "session transition");
        self.state = to;

        Ok(Transition { from, to, signal })
    }

    /// Accept a recognition result, producing the normalized transcript
    ///
    /// # Errors
    ///
    /// Returns `Error::Session` unless the session is listening
    pub fn accept_result(&mut self, raw: &str) -> Result<(Transcript, Transition)> {
        let transition = self.advance(SessionEvent::Result)?;
        Ok((Transcript::new(raw), transition))
    }

    /// Return to idle from any state, e.g. when a session is interrupted
    pub fn reset(&mut self) -> Option<StatusSignal> {
        let was_listening = self.state == SessionState::Listening;
        self.state = SessionState::Idle;
        was_listening.then_some(StatusSignal::ListeningEnded)
    }
}
