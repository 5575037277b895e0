//! Recording session state machine

use std::fmt;
use thiserror::Error;

/// Recorder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    #[default]
    Stopped,
    Recording,
    Paused,
}

impl SessionState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Recording => "recording",
            Self::Paused => "paused",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: SessionState,
    pub action: &'static str,
}

/// Recording session entity.
/// Tracks the recorder's state across user commands.
///
/// State machine:
///   STOPPED -> RECORDING (record)
///   RECORDING -> PAUSED (pause)
///   PAUSED -> RECORDING (record)
///   RECORDING | PAUSED -> STOPPED (stop)
#[derive(Debug, Default)]
pub struct RecordingSession {
    state: SessionState,
}

impl RecordingSession {
    /// Create a new session in stopped state
    pub fn new() -> Self {
        Self {
            state: SessionState::Stopped,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == SessionState::Stopped
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    /// Transition to RECORDING from STOPPED or PAUSED.
    /// Recording again while already recording is allowed and changes nothing.
    pub fn record(&mut self) {
        self.state = SessionState::Recording;
    }

    /// Transition from RECORDING to PAUSED
    pub fn pause(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state != SessionState::Recording {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "pause",
            });
        }
        self.state = SessionState::Paused;
        Ok(())
    }

    /// Transition from RECORDING or PAUSED to STOPPED
    pub fn stop(&mut self) -> Result<(), InvalidStateTransition> {
        if self.state == SessionState::Stopped {
            return Err(InvalidStateTransition {
                current_state: self.state,
                action: "stop",
            });
        }
        self.state = SessionState::Stopped;
        Ok(())
    }

    /// Adopt the state reported by the audio subsystem
    pub fn sync(&mut self, state: SessionState) {
        self.state = state;
    }
}
