//! Audio subsystem port

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::recording::{EncoderConfig, ProbedBuffer, SessionState};

/// Audio subsystem errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("No audio input device available")]
    NoAudioDevice,

    #[error("Audio input device not found: {0}")]
    DeviceNotFound(String),

    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("Recorder is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Failed to start recording: {0}")]
    StartFailed(String),

    #[error("Failed to encode recording: {0}")]
    EncodeFailed(String),

    #[error("Failed to write recording: {0}")]
    WriteFailed(String),
}

/// Notifications the audio subsystem delivers to the event loop
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Recorder state changed
    StateChanged(SessionState),
    /// Recorded duration in milliseconds
    DurationChanged(u64),
    /// A captured buffer passed the probe
    BufferProbed(ProbedBuffer),
    /// The recording was written to disk
    Saved(PathBuf),
    /// Capture or encoding failed after the recorder was started
    Failed(String),
}

/// Port for the audio capture and encoding subsystem.
///
/// All calls return promptly; capture runs elsewhere and reports back
/// through [`BackendEvent`]s.
pub trait AudioBackend {
    /// Names of the available input devices
    fn audio_inputs(&self) -> Vec<String>;

    /// Name of the default input device, if there is one
    fn default_audio_input(&self) -> Option<String>;

    /// Codec names the encoder can write
    fn supported_codecs(&self) -> Vec<String>;

    /// Sample rates the selected input supports
    fn supported_sample_rates(&self) -> Vec<u32>;

    /// Where the next recording is written
    fn set_output_location(&mut self, path: &Path);

    /// Select the input device; `None` uses the default input
    fn set_audio_input(&mut self, device: Option<&str>);

    /// Whether the selected input can be opened
    fn is_available(&self) -> bool;

    /// Apply encoder settings for the next recording
    fn set_audio_settings(&mut self, config: &EncoderConfig) -> Result<(), BackendError>;

    /// Start capturing, or resume a paused capture
    fn record(&mut self) -> Result<(), BackendError>;

    /// Pause capture, keeping what was recorded so far
    fn pause(&mut self) -> Result<(), BackendError>;

    /// Stop capture and finish the output file
    fn stop(&mut self) -> Result<(), BackendError>;
}
