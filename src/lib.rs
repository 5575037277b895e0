//! tapedeck - terminal audio recording panel
//!
//! Records from an audio input device with configurable codec, sample
//! rate, bit rate, channel count, quality and encoding mode, and shows live
//! statistics about the captured buffers while recording.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Encoder settings, session state, buffer stats, and errors
//! - **Application**: The recording session controller, panel state, and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal capture, WAV/FLAC writing, config file)
//! - **CLI**: Command-line interface, panel commands, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
