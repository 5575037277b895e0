//! Application layer - Use cases and port interfaces
//!
//! Contains the recording session controller, the panel state it feeds,
//! and trait definitions for external system interactions.

pub mod panel;
pub mod ports;
pub mod session;

// Re-export use cases
pub use panel::{ChannelObserver, EditError, PanelChoices, PanelEvent, PanelSelection, PanelState};
pub use session::RecordingSessionController;
