//! Recording infrastructure module
//!
//! Captures from an input device with cpal and writes the take as WAV or
//! FLAC, streaming to disk when the device already delivers the
//! configured layout.

mod cpal_backend;
mod encoder;

pub use cpal_backend::{CpalBackend, STANDARD_SAMPLE_RATES};
pub use encoder::{write_recording, CapturedAudio, EncodingError, TakeWriter};
