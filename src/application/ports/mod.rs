//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio;
pub mod config;
pub mod files;
pub mod observer;

// Re-export common types
pub use audio::{AudioBackend, BackendError, BackendEvent};
pub use config::ConfigStore;
pub use files::OutputFiles;
pub use observer::{ControlGates, SessionObserver};
