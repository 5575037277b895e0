//! Domain error types

use std::path::PathBuf;

use thiserror::Error;

/// Error raised when an encoder setting is out of range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncoderConfigError {
    #[error("Codec must not be empty")]
    EmptyCodec,

    #[error("Invalid channel count: {0}. Valid channel counts are: 1, 2, 4")]
    InvalidChannelCount(u16),

    #[error("Sample rate must be greater than zero")]
    ZeroSampleRate,

    #[error("Bit rate must be greater than zero")]
    ZeroBitRate,

    #[error("Invalid quality: \"{input}\". Valid qualities are: very-low, low, normal, high, very-high (or 0-4)")]
    InvalidQuality { input: String },

    #[error("Invalid encoding mode: \"{input}\". Valid modes are: quality, bitrate")]
    InvalidMode { input: String },
}

/// Error that keeps a recording from starting.
///
/// Both kinds are shown to the user as an alert; the session stays stopped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Set an output file before recording")]
    Config,

    #[error("Output file {} exists and could not be removed: {reason}", path.display())]
    FileConflict { path: PathBuf, reason: String },
}

/// Error when configuration fails
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Invalid config value for '{key}': {message}")]
    ValidationError { key: String, message: String },

    #[error("Config file already exists at: {0}")]
    AlreadyExists(String),
}
