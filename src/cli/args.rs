//! CLI argument definitions using Clap

use clap::{Parser, Subcommand};

use crate::domain::config::AppConfig;

/// tapedeck - terminal audio recording panel
#[derive(Parser, Debug)]
#[command(name = "tapedeck")]
#[command(version)]
#[command(about = "Record audio from an input device with live buffer stats")]
#[command(long_about = None)]
pub struct Cli {
    /// Input device name (default: system default input)
    #[arg(short = 'i', long, value_name = "NAME")]
    pub device: Option<String>,

    /// Codec to write (audio/pcm, audio/x-flac)
    #[arg(short = 'c', long, value_name = "CODEC")]
    pub codec: Option<String>,

    /// Sample rate in Hz
    #[arg(short = 'r', long, value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Bit rate in bits per second, used in bitrate mode
    #[arg(short = 'b', long, value_name = "BPS")]
    pub bit_rate: Option<u32>,

    /// Channel count (1, 2 or 4)
    #[arg(short = 'C', long, value_name = "N")]
    pub channels: Option<u16>,

    /// Encoding quality (very-low, low, normal, high, very-high or 0-4)
    #[arg(short = 'q', long, value_name = "QUALITY")]
    pub quality: Option<String>,

    /// Encoding mode (quality, bitrate)
    #[arg(short = 'm', long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Directory new recordings are written to
    #[arg(short = 'd', long, value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Output file, overriding the directory and file name
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<String>,

    /// Log debug output to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Panel settings given on the command line
    pub fn to_config(&self) -> AppConfig {
        AppConfig {
            device: self.device.clone(),
            codec: self.codec.clone(),
            sample_rate: self.sample_rate,
            bit_rate: self.bit_rate,
            channels: self.channels,
            quality: self.quality.clone(),
            mode: self.mode.clone(),
            output_dir: self.output_dir.clone(),
            file_name: None,
        }
    }
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List input devices and the settings they support
    Devices {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "device",
    "codec",
    "sample_rate",
    "bit_rate",
    "channels",
    "quality",
    "mode",
    "output_dir",
    "file_name",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
