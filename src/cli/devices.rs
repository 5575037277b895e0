//! Devices command handler

use serde::Serialize;

use crate::application::ports::AudioBackend;
use crate::application::PanelChoices;
use crate::domain::recording::{EncodingMode, EncodingQuality};

use super::presenter::Presenter;

/// What the audio subsystem offers, as printed by `tapedeck devices`
#[derive(Debug, Serialize)]
struct DeviceReport {
    devices: Vec<String>,
    default_device: Option<String>,
    codecs: Vec<String>,
    sample_rates: Vec<u32>,
    channel_counts: Vec<u16>,
    bit_rates: Vec<u32>,
    qualities: Vec<&'static str>,
    modes: Vec<&'static str>,
}

impl From<PanelChoices> for DeviceReport {
    fn from(choices: PanelChoices) -> Self {
        Self {
            devices: choices.devices,
            default_device: choices.default_device,
            codecs: choices.codecs,
            sample_rates: choices.sample_rates,
            channel_counts: choices.channel_counts,
            bit_rates: choices.bit_rates,
            qualities: EncodingQuality::ALL.iter().map(|q| q.as_str()).collect(),
            modes: [EncodingMode::ConstantQuality, EncodingMode::ConstantBitRate]
                .iter()
                .map(|m| m.as_str())
                .collect(),
        }
    }
}

/// Handle devices subcommand
pub fn handle_devices_command<A: AudioBackend>(
    backend: &A,
    json: bool,
    presenter: &Presenter,
) -> Result<(), serde_json::Error> {
    let report = DeviceReport::from(PanelChoices::query(backend));

    if json {
        presenter.output(&serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.devices.is_empty() {
        presenter.warn("No audio input devices found");
    }
    for device in &report.devices {
        let marker = if report.default_device.as_ref() == Some(device) {
            " (default)"
        } else {
            ""
        };
        presenter.output(&format!("{}{}", device, marker));
    }
    presenter.key_value("codecs", &report.codecs.join(", "));
    presenter.key_value("sample_rates", &join(&report.sample_rates));
    presenter.key_value("channels", &join(&report.channel_counts));
    presenter.key_value("bit_rates", &join(&report.bit_rates));
    presenter.key_value("quality", &report.qualities.join(", "));
    presenter.key_value("mode", &report.modes.join(", "));
    Ok(())
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::{BIT_RATE_OPTIONS, CHANNEL_OPTIONS};

    #[test]
    fn report_serializes_choice_lists() {
        let choices = PanelChoices {
            devices: vec!["Built-in Microphone".to_string()],
            default_device: Some("Built-in Microphone".to_string()),
            codecs: vec!["audio/pcm".to_string()],
            sample_rates: vec![44_100, 48_000],
            channel_counts: CHANNEL_OPTIONS.to_vec(),
            bit_rates: BIT_RATE_OPTIONS.to_vec(),
            max_quality_level: EncodingQuality::MAX_LEVEL,
        };

        let json = serde_json::to_value(DeviceReport::from(choices)).unwrap();
        assert_eq!(json["default_device"], "Built-in Microphone");
        assert_eq!(json["sample_rates"][1], 48_000);
        assert_eq!(json["channel_counts"], serde_json::json!([1, 2, 4]));
        assert_eq!(json["qualities"][0], "very-low");
        assert_eq!(json["modes"][1], "bitrate");
    }
}
