//! Application configuration value object

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::error::EncoderConfigError;
use crate::domain::recording::{
    EncoderConfig, EncodingMode, EncodingQuality, BIT_RATE_OPTIONS, CHANNEL_OPTIONS, CODEC_PCM,
};

/// Output file name used when none is configured
pub const DEFAULT_FILE_NAME: &str = "recording";

const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub device: Option<String>,
    pub codec: Option<String>,
    pub sample_rate: Option<u32>,
    pub bit_rate: Option<u32>,
    pub channels: Option<u16>,
    pub quality: Option<String>,
    pub mode: Option<String>,
    pub output_dir: Option<String>,
    pub file_name: Option<String>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            device: None,
            codec: Some(CODEC_PCM.to_string()),
            sample_rate: Some(DEFAULT_SAMPLE_RATE),
            bit_rate: Some(BIT_RATE_OPTIONS[0]),
            channels: Some(CHANNEL_OPTIONS[0]),
            quality: Some(EncodingQuality::default().to_string()),
            mode: Some(EncodingMode::default().to_string()),
            output_dir: None,
            file_name: Some(DEFAULT_FILE_NAME.to_string()),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            device: other.device.or(self.device),
            codec: other.codec.or(self.codec),
            sample_rate: other.sample_rate.or(self.sample_rate),
            bit_rate: other.bit_rate.or(self.bit_rate),
            channels: other.channels.or(self.channels),
            quality: other.quality.or(self.quality),
            mode: other.mode.or(self.mode),
            output_dir: other.output_dir.or(self.output_dir),
            file_name: other.file_name.or(self.file_name),
        }
    }

    pub fn codec_or_default(&self) -> &str {
        self.codec.as_deref().unwrap_or(CODEC_PCM)
    }

    pub fn sample_rate_or_default(&self) -> u32 {
        self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)
    }

    pub fn bit_rate_or_default(&self) -> u32 {
        self.bit_rate.unwrap_or(BIT_RATE_OPTIONS[0])
    }

    pub fn channels_or_default(&self) -> u16 {
        self.channels.unwrap_or(CHANNEL_OPTIONS[0])
    }

    /// Get quality as parsed EncodingQuality, or Normal if not set/invalid
    pub fn quality_or_default(&self) -> EncodingQuality {
        self.quality
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Get mode as parsed EncodingMode, or constant quality if not set/invalid
    pub fn mode_or_default(&self) -> EncodingMode {
        self.mode
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Directory recordings go to, or the working directory
    pub fn output_dir_or_default(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn file_name_or_default(&self) -> &str {
        self.file_name.as_deref().unwrap_or(DEFAULT_FILE_NAME)
    }

    /// Build validated encoder settings from the configured values
    pub fn encoder_config(&self) -> Result<EncoderConfig, EncoderConfigError> {
        EncoderConfig::new(
            self.codec_or_default(),
            self.bit_rate_or_default(),
            self.sample_rate_or_default(),
            self.channels_or_default(),
            self.quality_or_default(),
            self.mode_or_default(),
        )
    }
}
