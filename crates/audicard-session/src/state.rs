//! Session lifecycle state machine.
//!
//! A read session moves through a fixed set of states:
//!
//! - `Idle`: no session has run yet
//! - `Initializing`: handshake started, first reset pending
//! - `AwaitingSecondReset`: first reset observed, second reset issued
//! - `PollingActive`: handshake complete, cadence loop running
//! - `Terminating`: shutdown sequence in progress
//! - `Terminated`: reader released; a new session may start
//!
//! The machine validates every transition; session state lives here
//! explicitly instead of being implied by scattered flags.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use audicard_core::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Lifecycle states of a read session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session has run yet.
    Idle,

    /// Handshake started; waiting for the first reset completion.
    Initializing,

    /// First reset observed and the delayed second reset issued; waiting for
    /// its completion.
    AwaitingSecondReset,

    /// Handshake complete; the cadence loop is polling.
    PollingActive,

    /// Shutdown sequence in progress.
    Terminating,

    /// Reader released; a new session may start.
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            Self::Idle => "Idle",
            Self::Initializing => "Initializing",
            Self::AwaitingSecondReset => "AwaitingSecondReset",
            Self::PollingActive => "PollingActive",
            Self::Terminating => "Terminating",
            Self::Terminated => "Terminated",
        };
        write!(f, "{state}")
    }
}

impl SessionState {
    /// Check if transition to the target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use audicard_session::state::SessionState;
    ///
    /// assert!(SessionState::Idle.can_transition_to(&SessionState::Initializing));
    /// assert!(!SessionState::Idle.can_transition_to(&SessionState::PollingActive));
    /// ```
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        matches!(
            (self, target),
            // A new session may start from scratch or after a previous one
            (Self::Idle | Self::Terminated, Self::Initializing)
                // Handshake progress, or abort on handshake failure/stop
                | (Self::Initializing, Self::AwaitingSecondReset | Self::Terminating)
                | (Self::AwaitingSecondReset, Self::PollingActive | Self::Terminating)
                // The loop only ever exits through the shutdown sequence
                | (Self::PollingActive, Self::Terminating)
                | (Self::Terminating, Self::Terminated)
        )
    }

    /// Whether a session in this state still holds the reader.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Terminated)
    }
}

/// State machine owning the current session state.
///
/// Not thread-safe by itself; the session shares it between tasks as
/// [`SharedState`].
#[derive(Debug)]
pub struct SessionStateMachine {
    current: SessionState,
    entered_at: Instant,
}

impl SessionStateMachine {
    /// Create a new machine in the `Idle` state.
    pub fn new() -> Self {
        Self {
            current: SessionState::Idle,
            entered_at: Instant::now(),
        }
    }

    /// The current state.
    pub fn current(&self) -> SessionState {
        self.current
    }

    /// Time elapsed in the current state.
    pub fn time_in_state(&self) -> Duration {
        self.entered_at.elapsed()
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateTransition`] if the lifecycle does not
    /// allow the requested change; the current state is left untouched.
    pub fn transition_to(&mut self, target: SessionState) -> Result<()> {
        if !self.current.can_transition_to(&target) {
            return Err(Error::InvalidStateTransition {
                from: self.current.to_string(),
                to: target.to_string(),
            });
        }
        self.current = target;
        self.entered_at = Instant::now();
        Ok(())
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// State machine shared between the service and the session tasks.
pub type SharedState = Arc<Mutex<SessionStateMachine>>;

/// Create a fresh shared state machine.
pub fn shared_state() -> SharedState {
    Arc::new(Mutex::new(SessionStateMachine::new()))
}

/// Read the current state out of a shared machine.
pub fn current_state(state: &SharedState) -> SessionState {
    state
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .current()
}

/// Transition a shared machine, propagating rejection.
pub(crate) fn transition(state: &SharedState, target: SessionState) -> Result<()> {
    state
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .transition_to(target)
}

/// Transition a shared machine from task context, where a rejected transition
/// indicates a lifecycle bug rather than a recoverable condition.
pub(crate) fn advance(state: &SharedState, target: SessionState) {
    if let Err(error) = transition(state, target) {
        warn!(%error, "session state transition rejected");
    }
}
