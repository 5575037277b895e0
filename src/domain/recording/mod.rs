//! Recording value objects and the session state machine

mod buffer;
mod encoder;
mod state;

pub use buffer::{AudioFormat, BufferStats, ByteOrder, ProbedBuffer, SampleType};
pub use encoder::{
    EncoderConfig, EncodingMode, EncodingQuality, BIT_RATE_OPTIONS, CHANNEL_OPTIONS, CODEC_FLAC,
    CODEC_PCM,
};
pub use state::{InvalidStateTransition, RecordingSession, SessionState};
