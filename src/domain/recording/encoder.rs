//! Encoder settings value objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::EncoderConfigError;

/// Codec name for uncompressed PCM in a WAV container
pub const CODEC_PCM: &str = "audio/pcm";

/// Codec name for lossless FLAC
pub const CODEC_FLAC: &str = "audio/x-flac";

/// Channel counts the panel offers
pub const CHANNEL_OPTIONS: [u16; 3] = [1, 2, 4];

/// Bit rates the panel offers (bits per second)
pub const BIT_RATE_OPTIONS: [u32; 4] = [32_000, 64_000, 96_000, 128_000];

/// PCM depths the encoders can write
const SAMPLE_DEPTHS: [u16; 3] = [8, 16, 24];

/// Encoding quality, ordered from lowest to highest.
///
/// The numeric level (0..=4) is what the quality slider moves over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingQuality {
    VeryLow,
    Low,
    #[default]
    Normal,
    High,
    VeryHigh,
}

impl EncodingQuality {
    /// All qualities in slider order
    pub const ALL: [EncodingQuality; 5] = [
        Self::VeryLow,
        Self::Low,
        Self::Normal,
        Self::High,
        Self::VeryHigh,
    ];

    /// Highest slider level
    pub const MAX_LEVEL: u8 = 4;

    /// Slider level of this quality
    pub const fn level(&self) -> u8 {
        match self {
            Self::VeryLow => 0,
            Self::Low => 1,
            Self::Normal => 2,
            Self::High => 3,
            Self::VeryHigh => 4,
        }
    }

    /// Quality at a slider level
    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get(level as usize).copied()
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "very-low",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::VeryHigh => "very-high",
        }
    }
}

impl fmt::Display for EncodingQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EncodingQuality {
    type Err = EncoderConfigError;

    /// Accepts a name ("high", "very-high") or a slider level ("3")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        if let Ok(level) = input.parse::<u8>() {
            return Self::from_level(level)
                .ok_or(EncoderConfigError::InvalidQuality { input: s.to_string() });
        }
        Self::ALL
            .into_iter()
            .find(|q| q.as_str() == input.replace('_', "-"))
            .ok_or(EncoderConfigError::InvalidQuality { input: s.to_string() })
    }
}

/// Whether the encoder holds quality or bit rate constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingMode {
    #[default]
    ConstantQuality,
    ConstantBitRate,
}

impl EncodingMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConstantQuality => "quality",
            Self::ConstantBitRate => "bitrate",
        }
    }
}

impl fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EncodingMode {
    type Err = EncoderConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "quality" | "constant-quality" | "cq" => Ok(Self::ConstantQuality),
            "bitrate" | "bit-rate" | "constant-bit-rate" | "cbr" => Ok(Self::ConstantBitRate),
            _ => Err(EncoderConfigError::InvalidMode { input: s.to_string() }),
        }
    }
}

/// Encoder settings applied to the audio subsystem before a recording starts.
/// Validated on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    codec: String,
    bit_rate: u32,
    sample_rate: u32,
    channel_count: u16,
    quality: EncodingQuality,
    mode: EncodingMode,
}

impl EncoderConfig {
    pub fn new(
        codec: impl Into<String>,
        bit_rate: u32,
        sample_rate: u32,
        channel_count: u16,
        quality: EncodingQuality,
        mode: EncodingMode,
    ) -> Result<Self, EncoderConfigError> {
        let codec = codec.into().trim().to_string();
        if codec.is_empty() {
            return Err(EncoderConfigError::EmptyCodec);
        }
        if !CHANNEL_OPTIONS.contains(&channel_count) {
            return Err(EncoderConfigError::InvalidChannelCount(channel_count));
        }
        if sample_rate == 0 {
            return Err(EncoderConfigError::ZeroSampleRate);
        }
        if bit_rate == 0 {
            return Err(EncoderConfigError::ZeroBitRate);
        }

        Ok(Self {
            codec,
            bit_rate,
            sample_rate,
            channel_count,
            quality,
            mode,
        })
    }

    pub fn codec(&self) -> &str {
        &self.codec
    }

    pub fn bit_rate(&self) -> u32 {
        self.bit_rate
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn quality(&self) -> EncodingQuality {
        self.quality
    }

    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    /// PCM depth the encoder writes.
    ///
    /// Constant quality picks the depth from the quality level; constant bit
    /// rate picks the deepest sample that fits the per-sample bit budget.
    pub fn sample_bits(&self) -> u16 {
        match self.mode {
            EncodingMode::ConstantQuality => match self.quality {
                EncodingQuality::VeryLow | EncodingQuality::Low => 8,
                EncodingQuality::Normal | EncodingQuality::High => 16,
                EncodingQuality::VeryHigh => 24,
            },
            EncodingMode::ConstantBitRate => {
                let budget =
                    self.bit_rate as u64 / (self.sample_rate as u64 * self.channel_count as u64);
                SAMPLE_DEPTHS
                    .into_iter()
                    .filter(|&bits| bits as u64 <= budget)
                    .max()
                    .unwrap_or(SAMPLE_DEPTHS[0])
            }
        }
    }
}

impl fmt::Display for EncoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} Hz {}ch {} bps quality={} mode={}",
            self.codec, self.sample_rate, self.channel_count, self.bit_rate, self.quality, self.mode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(quality: EncodingQuality, mode: EncodingMode, bit_rate: u32) -> EncoderConfig {
        EncoderConfig::new(CODEC_PCM, bit_rate, 44_100, 2, quality, mode).unwrap()
    }

    #[test]
    fn rejects_unsupported_channel_count() {
        let err = EncoderConfig::new(
            CODEC_PCM,
            64_000,
            44_100,
            3,
            EncodingQuality::Normal,
            EncodingMode::ConstantQuality,
        )
        .unwrap_err();
        assert_eq!(err, EncoderConfigError::InvalidChannelCount(3));
    }

    #[test]
    fn rejects_empty_codec() {
        let err = EncoderConfig::new(
            "  ",
            64_000,
            44_100,
            1,
            EncodingQuality::Normal,
            EncodingMode::ConstantQuality,
        )
        .unwrap_err();
        assert_eq!(err, EncoderConfigError::EmptyCodec);
    }

    #[test]
    fn rejects_zero_rates() {
        let zero_rate = EncoderConfig::new(
            CODEC_PCM,
            64_000,
            0,
            1,
            EncodingQuality::Normal,
            EncodingMode::ConstantQuality,
        );
        assert_eq!(zero_rate.unwrap_err(), EncoderConfigError::ZeroSampleRate);

        let zero_bits = EncoderConfig::new(
            CODEC_PCM,
            0,
            44_100,
            1,
            EncodingQuality::Normal,
            EncodingMode::ConstantQuality,
        );
        assert_eq!(zero_bits.unwrap_err(), EncoderConfigError::ZeroBitRate);
    }

    #[test]
    fn quality_levels_match_slider() {
        assert_eq!(EncodingQuality::default(), EncodingQuality::Normal);
        assert_eq!(EncodingQuality::Normal.level(), 2);
        assert_eq!(EncodingQuality::from_level(4), Some(EncodingQuality::VeryHigh));
        assert_eq!(EncodingQuality::from_level(5), None);
    }

    #[test]
    fn quality_parses_names_and_levels() {
        assert_eq!("very-high".parse::<EncodingQuality>(), Ok(EncodingQuality::VeryHigh));
        assert_eq!("Very_Low".parse::<EncodingQuality>(), Ok(EncodingQuality::VeryLow));
        assert_eq!("1".parse::<EncodingQuality>(), Ok(EncodingQuality::Low));
        assert!("9".parse::<EncodingQuality>().is_err());
        assert!("loud".parse::<EncodingQuality>().is_err());
    }

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("quality".parse::<EncodingMode>(), Ok(EncodingMode::ConstantQuality));
        assert_eq!("CBR".parse::<EncodingMode>(), Ok(EncodingMode::ConstantBitRate));
        assert!("vbr".parse::<EncodingMode>().is_err());
    }

    #[test]
    fn constant_quality_depths() {
        let bits = |q| config(q, EncodingMode::ConstantQuality, 64_000).sample_bits();
        assert_eq!(bits(EncodingQuality::VeryLow), 8);
        assert_eq!(bits(EncodingQuality::Normal), 16);
        assert_eq!(bits(EncodingQuality::VeryHigh), 24);
    }

    #[test]
    fn constant_bit_rate_fits_budget() {
        // 44.1 kHz stereo: 1.4 Mbit/s buys 16 bits, 2.2 Mbit/s buys 24
        let cbr = |rate| config(EncodingQuality::Normal, EncodingMode::ConstantBitRate, rate);
        assert_eq!(cbr(128_000).sample_bits(), 8);
        assert_eq!(cbr(1_411_200).sample_bits(), 16);
        assert_eq!(cbr(2_116_800).sample_bits(), 24);
    }
}
