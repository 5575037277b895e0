//! Panel presentation state
//!
//! [`PanelState`] is everything the panel shows. It changes only through
//! [`PanelState::apply`] with events the session controller emits, and
//! through edits that the current control gates allow.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::domain::config::AppConfig;
use crate::domain::error::{EncoderConfigError, SessionError};
use crate::domain::recording::{
    BufferStats, EncoderConfig, EncodingMode, EncodingQuality, BIT_RATE_OPTIONS, CHANNEL_OPTIONS,
    CODEC_FLAC,
};

use super::ports::{AudioBackend, ControlGates, SessionObserver};

/// Updates flowing from the controller to the panel
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    Gates(ControlGates),
    Elapsed(u64),
    Stats(BufferStats),
    Alert(String),
}

/// Observer that forwards controller output over a channel to the render loop
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<PanelEvent>,
}

impl ChannelObserver {
    pub fn new(tx: mpsc::UnboundedSender<PanelEvent>) -> Self {
        Self { tx }
    }

    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PanelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, event: PanelEvent) {
        // The render loop only goes away on shutdown
        let _ = self.tx.send(event);
    }
}

impl SessionObserver for ChannelObserver {
    fn state_changed(&self, gates: ControlGates) {
        self.send(PanelEvent::Gates(gates));
    }

    fn elapsed_changed(&self, seconds: u64) {
        self.send(PanelEvent::Elapsed(seconds));
    }

    fn buffer_probed(&self, stats: &BufferStats) {
        self.send(PanelEvent::Stats(stats.clone()));
    }

    fn alert(&self, error: &SessionError) {
        self.send(PanelEvent::Alert(error.to_string()));
    }
}

/// Choice lists offered by the panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelChoices {
    pub devices: Vec<String>,
    pub default_device: Option<String>,
    pub codecs: Vec<String>,
    pub sample_rates: Vec<u32>,
    pub channel_counts: Vec<u16>,
    pub bit_rates: Vec<u32>,
    pub max_quality_level: u8,
}

impl PanelChoices {
    /// Query the audio subsystem for what it offers
    pub fn query<A: AudioBackend>(backend: &A) -> Self {
        Self {
            devices: backend.audio_inputs(),
            default_device: backend.default_audio_input(),
            codecs: backend.supported_codecs(),
            sample_rates: backend.supported_sample_rates(),
            channel_counts: CHANNEL_OPTIONS.to_vec(),
            bit_rates: BIT_RATE_OPTIONS.to_vec(),
            max_quality_level: EncodingQuality::MAX_LEVEL,
        }
    }
}

/// Current values of the panel's inputs
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSelection {
    pub device: Option<String>,
    pub codec: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_rate: u32,
    pub quality: EncodingQuality,
    pub mode: EncodingMode,
}

impl PanelSelection {
    pub fn encoder_config(&self) -> Result<EncoderConfig, EncoderConfigError> {
        EncoderConfig::new(
            &self.codec,
            self.bit_rate,
            self.sample_rate,
            self.channels,
            self.quality,
            self.mode,
        )
    }
}

impl From<&AppConfig> for PanelSelection {
    fn from(config: &AppConfig) -> Self {
        Self {
            device: config.device.clone(),
            codec: config.codec_or_default().to_string(),
            sample_rate: config.sample_rate_or_default(),
            channels: config.channels_or_default(),
            bit_rate: config.bit_rate_or_default(),
            quality: config.quality_or_default(),
            mode: config.mode_or_default(),
        }
    }
}

/// Why a panel edit was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Settings can only be changed while stopped")]
    Locked,

    #[error("Unknown setting: \"{0}\". Settings are: device, codec, rate, channels, bitrate, quality, mode")]
    UnknownField(String),

    #[error("Invalid value for {field}: \"{value}\"")]
    InvalidValue { field: &'static str, value: String },

    #[error(transparent)]
    Encoder(#[from] EncoderConfigError),
}

/// Everything the panel displays
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    pub choices: PanelChoices,
    pub selection: PanelSelection,
    pub output_path: String,
    pub file_name: String,
    pub gates: ControlGates,
    pub elapsed_secs: u64,
    pub stats: Option<BufferStats>,
    pub alert: Option<String>,
}

impl PanelState {
    pub fn new(choices: PanelChoices, config: &AppConfig) -> Self {
        let selection = PanelSelection::from(config);
        let file_name = config.file_name_or_default().to_string();
        let output_path = output_file_in(&config.output_dir_or_default(), &file_name, &selection.codec);

        Self {
            choices,
            selection,
            output_path: output_path.to_string_lossy().into_owned(),
            file_name,
            gates: ControlGates::default(),
            elapsed_secs: 0,
            stats: None,
            alert: None,
        }
    }

    /// Apply an update from the controller
    pub fn apply(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::Gates(gates) => {
                self.gates = gates;
                if gates.edit_output {
                    self.elapsed_secs = 0;
                }
            }
            PanelEvent::Elapsed(secs) => self.elapsed_secs = secs,
            PanelEvent::Stats(stats) => self.stats = Some(stats),
            PanelEvent::Alert(message) => self.alert = Some(message),
        }
    }

    /// Take the pending alert, if any
    pub fn take_alert(&mut self) -> Option<String> {
        self.alert.take()
    }

    /// Set the output file path directly
    pub fn set_output_path(&mut self, path: &str) -> Result<(), EditError> {
        if !self.gates.edit_output {
            return Err(EditError::Locked);
        }
        self.output_path = path.trim().to_string();
        Ok(())
    }

    /// Put the output file inside `dir`, keeping the configured file name
    pub fn choose_output_dir(&mut self, dir: &Path) -> Result<(), EditError> {
        if !self.gates.edit_output {
            return Err(EditError::Locked);
        }
        let path = output_file_in(dir, &self.file_name, &self.selection.codec);
        self.output_path = path.to_string_lossy().into_owned();
        Ok(())
    }

    /// Change one encoder or device setting by name
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), EditError> {
        if !self.gates.edit_output {
            return Err(EditError::Locked);
        }

        let value = value.trim();
        let mut selection = self.selection.clone();
        match field.trim().to_lowercase().as_str() {
            "device" | "input" => {
                selection.device = match value {
                    "" | "default" => None,
                    name => Some(name.to_string()),
                };
            }
            "codec" => selection.codec = value.to_string(),
            "rate" | "sample-rate" | "sample_rate" => {
                selection.sample_rate = parse_number("sample rate", value)?;
            }
            "channels" => selection.channels = parse_number("channels", value)?,
            "bitrate" | "bit-rate" | "bit_rate" => {
                selection.bit_rate = parse_number("bit rate", value)?;
            }
            "quality" => selection.quality = value.parse()?,
            "mode" => selection.mode = value.parse()?,
            other => return Err(EditError::UnknownField(other.to_string())),
        }
        selection.encoder_config()?;
        self.selection = selection;
        Ok(())
    }

    /// Encoder settings for the current selection
    pub fn encoder_config(&self) -> Result<EncoderConfig, EncoderConfigError> {
        self.selection.encoder_config()
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, EditError> {
    value.parse().map_err(|_| EditError::InvalidValue {
        field,
        value: value.to_string(),
    })
}

/// File extension matching a codec name
pub fn extension_for_codec(codec: &str) -> &'static str {
    if codec == CODEC_FLAC {
        "flac"
    } else {
        "wav"
    }
}

/// Output file for a directory, file name and codec
pub fn output_file_in(dir: &Path, file_name: &str, codec: &str) -> PathBuf {
    let mut path = dir.join(file_name);
    if path.extension().is_none() {
        path.set_extension(extension_for_codec(codec));
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::{ByteOrder, SampleType, SessionState};

    fn panel() -> PanelState {
        let config = AppConfig {
            output_dir: Some("/srv/takes".to_string()),
            ..AppConfig::defaults()
        };
        PanelState::new(PanelChoices::default(), &config)
    }

    fn stats() -> BufferStats {
        BufferStats {
            byte_count: 4096,
            duration_micros: 23_219,
            frame_count: 1024,
            sample_count: 2048,
            channel_count: 2,
            sample_bits: 16,
            sample_rate_hz: 44_100,
            bytes_per_frame: 4,
            byte_order: ByteOrder::Little,
            codec_name: "audio/pcm".to_string(),
            sample_type: SampleType::SignedInt,
        }
    }

    #[test]
    fn new_panel_uses_config() {
        let panel = panel();
        assert_eq!(panel.output_path, "/srv/takes/recording.wav");
        assert_eq!(panel.selection.sample_rate, 44_100);
        assert_eq!(panel.selection.quality, EncodingQuality::Normal);
        assert_eq!(panel.gates.state, SessionState::Stopped);
    }

    #[test]
    fn apply_updates_fields() {
        let mut panel = panel();
        panel.apply(PanelEvent::Gates(ControlGates::for_state(SessionState::Recording)));
        panel.apply(PanelEvent::Elapsed(12));
        panel.apply(PanelEvent::Stats(stats()));

        assert!(panel.gates.pause);
        assert_eq!(panel.elapsed_secs, 12);
        assert_eq!(panel.stats, Some(stats()));
    }

    #[test]
    fn stopping_resets_elapsed() {
        let mut panel = panel();
        panel.apply(PanelEvent::Elapsed(12));
        panel.apply(PanelEvent::Gates(ControlGates::for_state(SessionState::Stopped)));
        assert_eq!(panel.elapsed_secs, 0);
    }

    #[test]
    fn alert_is_taken_once() {
        let mut panel = panel();
        panel.apply(PanelEvent::Alert("Set an output file before recording".to_string()));
        assert!(panel.take_alert().is_some());
        assert!(panel.take_alert().is_none());
    }

    #[test]
    fn output_path_locked_while_recording() {
        let mut panel = panel();
        panel.apply(PanelEvent::Gates(ControlGates::for_state(SessionState::Recording)));

        assert_eq!(panel.set_output_path("/tmp/x.wav"), Err(EditError::Locked));
        assert_eq!(panel.choose_output_dir(Path::new("/tmp")), Err(EditError::Locked));
        assert_eq!(panel.set_field("codec", "audio/x-flac"), Err(EditError::Locked));
        assert_eq!(panel.output_path, "/srv/takes/recording.wav");
    }

    #[test]
    fn choose_output_dir_uses_codec_extension() {
        let mut panel = panel();
        panel.set_field("codec", "audio/x-flac").unwrap();
        panel.choose_output_dir(Path::new("/tmp/session")).unwrap();
        assert_eq!(panel.output_path, "/tmp/session/recording.flac");
    }

    #[test]
    fn set_field_validates_values() {
        let mut panel = panel();
        panel.set_field("channels", "2").unwrap();
        panel.set_field("quality", "4").unwrap();
        panel.set_field("mode", "bitrate").unwrap();
        panel.set_field("device", "default").unwrap();

        assert_eq!(panel.selection.channels, 2);
        assert_eq!(panel.selection.quality, EncodingQuality::VeryHigh);
        assert_eq!(panel.selection.mode, EncodingMode::ConstantBitRate);
        assert!(panel.selection.device.is_none());

        assert!(matches!(
            panel.set_field("rate", "fast"),
            Err(EditError::InvalidValue { field: "sample rate", .. })
        ));
        assert!(matches!(
            panel.set_field("volume", "11"),
            Err(EditError::UnknownField(_))
        ));
    }

    #[test]
    fn invalid_channel_count_is_reported() {
        let mut panel = panel();
        assert_eq!(
            panel.set_field("channels", "3"),
            Err(EditError::Encoder(EncoderConfigError::InvalidChannelCount(3)))
        );
        assert_eq!(panel.selection.channels, 1);
    }

    #[test]
    fn output_file_keeps_explicit_extension() {
        let path = output_file_in(Path::new("/a"), "take.ogg", "audio/pcm");
        assert_eq!(path, PathBuf::from("/a/take.ogg"));
    }

    #[tokio::test]
    async fn channel_observer_forwards_events() {
        let (observer, mut rx) = ChannelObserver::channel();
        observer.elapsed_changed(7);
        observer.alert(&SessionError::Config);

        assert_eq!(rx.recv().await, Some(PanelEvent::Elapsed(7)));
        assert_eq!(
            rx.recv().await,
            Some(PanelEvent::Alert("Set an output file before recording".to_string()))
        );
    }
}
