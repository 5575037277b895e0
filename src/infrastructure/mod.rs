//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with the audio host, the filesystem and the config file.

pub mod config;
pub mod files;
pub mod recording;

// Re-export adapters
pub use config::XdgConfigStore;
pub use files::LocalFiles;
pub use recording::CpalBackend;
