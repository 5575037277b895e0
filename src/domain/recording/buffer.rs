//! Captured buffer descriptions and the stats derived from them

use std::fmt;

use serde::Serialize;

/// Byte order of samples in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the machine we run on
    pub const fn native() -> Self {
        if cfg!(target_endian = "little") {
            Self::Little
        } else {
            Self::Big
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Little => "LittleEndian",
            Self::Big => "BigEndian",
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Numeric representation of samples in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SampleType {
    SignedInt,
    UnsignedInt,
    Float,
    #[default]
    Unknown,
}

impl SampleType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SignedInt => "SignedInt",
            Self::UnsignedInt => "UnsignedInt",
            Self::Float => "Float",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Format descriptor attached to a captured buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFormat {
    pub channel_count: u16,
    pub sample_bits: u16,
    pub sample_rate_hz: u32,
    pub byte_order: ByteOrder,
    pub codec: String,
    pub sample_type: SampleType,
}

impl AudioFormat {
    pub fn bytes_per_frame(&self) -> u32 {
        self.channel_count as u32 * self.sample_bits as u32 / 8
    }
}

/// A captured audio buffer as handed out by the probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedBuffer {
    pub byte_count: u64,
    pub duration_micros: u64,
    pub frame_count: u64,
    pub sample_count: u64,
    pub format: AudioFormat,
}

impl ProbedBuffer {
    /// Describe `sample_count` interleaved samples of the given format
    pub fn from_sample_count(sample_count: usize, format: AudioFormat) -> Self {
        let sample_count = sample_count as u64;
        let channels = format.channel_count.max(1) as u64;
        let frame_count = sample_count / channels;
        let byte_count = sample_count * format.sample_bits as u64 / 8;
        let duration_micros = if format.sample_rate_hz == 0 {
            0
        } else {
            frame_count * 1_000_000 / format.sample_rate_hz as u64
        };

        Self {
            byte_count,
            duration_micros,
            frame_count,
            sample_count,
            format,
        }
    }
}

/// Per-buffer snapshot shown on the panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    pub byte_count: u64,
    pub duration_micros: u64,
    pub frame_count: u64,
    pub sample_count: u64,
    pub channel_count: u16,
    pub sample_bits: u16,
    pub sample_rate_hz: u32,
    pub bytes_per_frame: u32,
    pub byte_order: ByteOrder,
    pub codec_name: String,
    pub sample_type: SampleType,
}

impl BufferStats {
    /// Buffer duration in whole milliseconds, as the panel displays it
    pub fn duration_millis(&self) -> u64 {
        self.duration_micros / 1000
    }
}

impl From<&ProbedBuffer> for BufferStats {
    fn from(buffer: &ProbedBuffer) -> Self {
        let format = &buffer.format;
        Self {
            byte_count: buffer.byte_count,
            duration_micros: buffer.duration_micros,
            frame_count: buffer.frame_count,
            sample_count: buffer.sample_count,
            channel_count: format.channel_count,
            sample_bits: format.sample_bits,
            sample_rate_hz: format.sample_rate_hz,
            bytes_per_frame: format.bytes_per_frame(),
            byte_order: format.byte_order,
            codec_name: format.codec.clone(),
            sample_type: format.sample_type,
        }
    }
}
