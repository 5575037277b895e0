//! Domain layer - Core recording model
//!
//! Contains value objects, entities, and domain errors.
//! This layer has no dependencies on external systems.

pub mod config;
pub mod error;
pub mod recording;

// Re-export common types
pub use config::AppConfig;
pub use error::*;
pub use recording::{
    BufferStats, EncoderConfig, EncodingMode, EncodingQuality, ProbedBuffer, RecordingSession,
    SessionState,
};
