//! Observer port for session output

use crate::domain::error::SessionError;
use crate::domain::recording::{BufferStats, SessionState};

/// Which panel controls are enabled in a given state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlGates {
    pub state: SessionState,
    pub start: bool,
    pub pause: bool,
    pub stop: bool,
    pub edit_output: bool,
}

impl ControlGates {
    pub fn for_state(state: SessionState) -> Self {
        Self {
            state,
            start: state != SessionState::Recording,
            pause: state == SessionState::Recording,
            stop: state != SessionState::Stopped,
            edit_output: state == SessionState::Stopped,
        }
    }
}

impl Default for ControlGates {
    fn default() -> Self {
        Self::for_state(SessionState::Stopped)
    }
}

/// Port for whatever presents the session to the user
pub trait SessionObserver {
    /// Recorder state changed
    fn state_changed(&self, gates: ControlGates);

    /// Whole seconds recorded so far
    fn elapsed_changed(&self, seconds: u64);

    /// Stats of the latest probed buffer
    fn buffer_probed(&self, stats: &BufferStats);

    /// A recording could not start
    fn alert(&self, error: &SessionError);
}
