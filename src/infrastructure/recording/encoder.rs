//! Writes captured audio in the configured output format
//!
//! Captured samples arrive interleaved at the device's rate and channel
//! layout. Before writing they are:
//! - remixed to the configured channel count
//! - resampled to the configured sample rate
//! - quantised to the depth the encoder settings ask for
//!
//! `audio/pcm` is written as WAV, `audio/x-flac` as FLAC. PCM captured
//! at the configured rate and channel count needs none of that and is
//! streamed to disk as it arrives.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;
use rubato::{FftFixedIn, Resampler};

use crate::domain::recording::{EncoderConfig, CODEC_FLAC, CODEC_PCM};

/// Frames fed to the resampler per chunk
const RESAMPLE_CHUNK: usize = 1024;

/// Audio captured from the device, interleaved f32 in [-1.0, 1.0]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedAudio {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

/// Encoding errors
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("No audio data captured")]
    Empty,

    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("FLAC config error: {0}")]
    FlacConfig(String),

    #[error("FLAC encoding failed: {0}")]
    FlacEncode(String),

    #[error("WAV write failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Encode `audio` with `config` and write it to `path`
pub fn write_recording(
    path: &Path,
    audio: &CapturedAudio,
    config: &EncoderConfig,
) -> Result<(), EncodingError> {
    if audio.samples.is_empty() || audio.channels == 0 {
        return Err(EncodingError::Empty);
    }

    let planar = remix(&audio.samples, audio.channels, config.channel_count());
    let planar = resample(planar, audio.sample_rate, config.sample_rate())?;
    let bits = config.sample_bits();
    let samples = quantize(&planar, bits);

    match config.codec() {
        CODEC_PCM => write_wav(path, &samples, config.channel_count(), config.sample_rate(), bits),
        CODEC_FLAC => {
            let bytes = encode_flac(&samples, config.channel_count(), config.sample_rate(), bits)?;
            std::fs::write(path, bytes)?;
            Ok(())
        }
        other => Err(EncodingError::UnsupportedCodec(other.to_string())),
    }
}

/// Destination for one take, fed while capture runs
pub enum TakeWriter {
    /// Samples go straight into the WAV file
    Streaming { path: PathBuf, wav: WavStream },
    /// Samples are kept until the take ends, then converted and encoded
    Buffered {
        path: PathBuf,
        config: EncoderConfig,
        audio: CapturedAudio,
    },
}

impl TakeWriter {
    /// Open a take captured with `channels` at `sample_rate`
    pub fn open(
        path: &Path,
        config: &EncoderConfig,
        channels: u16,
        sample_rate: u32,
    ) -> Result<Self, EncodingError> {
        let direct = config.codec() == CODEC_PCM
            && config.channel_count() == channels
            && config.sample_rate() == sample_rate;

        if direct {
            return Ok(Self::Streaming {
                path: path.to_path_buf(),
                wav: WavStream::create(path, config)?,
            });
        }
        Ok(Self::Buffered {
            path: path.to_path_buf(),
            config: config.clone(),
            audio: CapturedAudio {
                samples: Vec::new(),
                channels,
                sample_rate,
            },
        })
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming { .. })
    }

    /// Add interleaved samples in [-1.0, 1.0]
    pub fn push(&mut self, samples: &[f32]) -> Result<(), EncodingError> {
        match self {
            Self::Streaming { wav, .. } => wav.write(samples),
            Self::Buffered { audio, .. } => {
                audio.samples.extend_from_slice(samples);
                Ok(())
            }
        }
    }

    /// Complete the output file
    pub fn finish(self) -> Result<(), EncodingError> {
        match self {
            Self::Streaming { wav, .. } => wav.finalize(),
            Self::Buffered {
                path,
                config,
                audio,
            } => write_recording(&path, &audio, &config),
        }
    }

    /// Drop the take, removing anything already written
    pub fn discard(self) {
        if let Self::Streaming { path, wav } = self {
            drop(wav);
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Incremental WAV writer quantising to the configured depth
pub struct WavStream {
    writer: hound::WavWriter<BufWriter<File>>,
    max: f32,
    samples_written: u64,
}

impl WavStream {
    pub fn create(path: &Path, config: &EncoderConfig) -> Result<Self, EncodingError> {
        let bits = config.sample_bits();
        let spec = wav_spec(config.channel_count(), config.sample_rate(), bits);
        Ok(Self {
            writer: hound::WavWriter::create(path, spec)?,
            max: full_scale(bits),
            samples_written: 0,
        })
    }

    pub fn write(&mut self, samples: &[f32]) -> Result<(), EncodingError> {
        for &sample in samples {
            self.writer.write_sample(scale(sample, self.max))?;
        }
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    pub fn finalize(self) -> Result<(), EncodingError> {
        let empty = self.samples_written == 0;
        self.writer.finalize()?;
        if empty {
            return Err(EncodingError::Empty);
        }
        Ok(())
    }
}

/// Split interleaved samples into `to` channel planes.
///
/// Mono output averages every input channel; otherwise output channel `n`
/// takes input channel `n % from`.
fn remix(samples: &[f32], from: u16, to: u16) -> Vec<Vec<f32>> {
    let from = from.max(1) as usize;
    let to = to.max(1) as usize;
    let frames = samples.len() / from;
    let mut planes = vec![Vec::with_capacity(frames); to];

    for frame in samples.chunks_exact(from) {
        if to == 1 {
            planes[0].push(frame.iter().sum::<f32>() / from as f32);
        } else {
            for (ch, plane) in planes.iter_mut().enumerate() {
                plane.push(frame[ch % from]);
            }
        }
    }
    planes
}

/// Resample every plane from `source_rate` to `target_rate`
fn resample(
    planes: Vec<Vec<f32>>,
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<Vec<f32>>, EncodingError> {
    if source_rate == target_rate || planes.is_empty() {
        return Ok(planes);
    }

    let frames = planes[0].len();
    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (frames as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        RESAMPLE_CHUNK,
        2, // Sub-chunks
        planes.len(),
    )
    .map_err(|e| EncodingError::Resample(format!("init failed: {}", e)))?;

    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(output_len); planes.len()];
    let mut input_pos = 0;

    while input_pos < frames {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(frames);

        // Pad the last chunk with silence
        let chunk: Vec<Vec<f32>> = planes
            .iter()
            .map(|plane| {
                let mut part = plane[input_pos..end_pos].to_vec();
                part.resize(frames_needed, 0.0);
                part
            })
            .collect();

        let resampled = resampler
            .process(&chunk, None)
            .map_err(|e| EncodingError::Resample(e.to_string()))?;

        for (out, plane) in output.iter_mut().zip(resampled) {
            out.extend(plane);
        }
        input_pos = end_pos;
    }

    for plane in &mut output {
        plane.resize(output_len, 0.0);
    }
    Ok(output)
}

/// Interleave planes as signed integers of `bits` depth
fn quantize(planes: &[Vec<f32>], bits: u16) -> Vec<i32> {
    let max = full_scale(bits);
    let frames = planes.first().map_or(0, Vec::len);
    let mut samples = Vec::with_capacity(frames * planes.len());

    for i in 0..frames {
        for plane in planes {
            samples.push(scale(plane[i], max));
        }
    }
    samples
}

/// Largest sample value at `bits` depth
fn full_scale(bits: u16) -> f32 {
    ((1i64 << (bits - 1)) - 1) as f32
}

fn scale(sample: f32, max: f32) -> i32 {
    (sample.clamp(-1.0, 1.0) * max).round() as i32
}

fn wav_spec(channels: u16, sample_rate: u32, bits: u16) -> hound::WavSpec {
    hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: bits,
        sample_format: hound::SampleFormat::Int,
    }
}

fn write_wav(
    path: &Path,
    samples: &[i32],
    channels: u16,
    sample_rate: u32,
    bits: u16,
) -> Result<(), EncodingError> {
    let mut writer = hound::WavWriter::create(path, wav_spec(channels, sample_rate, bits))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

fn encode_flac(
    samples: &[i32],
    channels: u16,
    sample_rate: u32,
    bits: u16,
) -> Result<Vec<u8>, EncodingError> {
    let config = config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| EncodingError::FlacConfig(format!("{:?}", e)))?;

    let source = MemSource::from_samples(
        samples,
        channels as usize,
        bits as usize,
        sample_rate as usize,
    );

    let flac_stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| EncodingError::FlacEncode(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    flac_stream
        .write(&mut sink)
        .map_err(|e| EncodingError::FlacEncode(e.to_string()))?;

    Ok(sink.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::{EncodingMode, EncodingQuality};

    fn encoder(codec: &str, rate: u32, channels: u16, quality: EncodingQuality) -> EncoderConfig {
        EncoderConfig::new(codec, 64_000, rate, channels, quality, EncodingMode::ConstantQuality)
            .unwrap()
    }

    fn sine(rate: u32, channels: u16, secs: f32) -> CapturedAudio {
        let frames = (rate as f32 * secs) as usize;
        let samples = (0..frames)
            .flat_map(|i| {
                let t = i as f32 / rate as f32;
                let s = f32::sin(2.0 * std::f32::consts::PI * 440.0 * t) * 0.5;
                std::iter::repeat(s).take(channels as usize)
            })
            .collect();
        CapturedAudio {
            samples,
            channels,
            sample_rate: rate,
        }
    }

    #[test]
    fn remix_stereo_to_mono_averages() {
        let planes = remix(&[0.2, 0.4, -0.5, 0.5], 2, 1);
        assert_eq!(planes.len(), 1);
        assert!((planes[0][0] - 0.3).abs() < 1e-6);
        assert!(planes[0][1].abs() < 1e-6);
    }

    #[test]
    fn remix_mono_to_quad_duplicates() {
        let planes = remix(&[0.1, 0.2], 1, 4);
        assert_eq!(planes.len(), 4);
        for plane in &planes {
            assert_eq!(plane, &vec![0.1, 0.2]);
        }
    }

    #[test]
    fn remix_stereo_to_quad_wraps_channels() {
        let planes = remix(&[0.1, 0.9], 2, 4);
        assert_eq!(planes[0], vec![0.1]);
        assert_eq!(planes[1], vec![0.9]);
        assert_eq!(planes[2], vec![0.1]);
        assert_eq!(planes[3], vec![0.9]);
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let planes = vec![vec![0.1, 0.2, 0.3]];
        let out = resample(planes.clone(), 44_100, 44_100).unwrap();
        assert_eq!(out, planes);
    }

    #[test]
    fn resample_halves_length() {
        let planes = vec![vec![0.0; 48_000], vec![0.0; 48_000]];
        let out = resample(planes, 48_000, 24_000).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 24_000);
        assert_eq!(out[1].len(), 24_000);
    }

    #[test]
    fn quantize_scales_to_depth() {
        let planes = vec![vec![1.0, -1.0, 0.0, 2.0]];
        assert_eq!(quantize(&planes, 16), vec![32_767, -32_767, 0, 32_767]);
        assert_eq!(quantize(&planes, 8), vec![127, -127, 0, 127]);
    }

    #[test]
    fn quantize_interleaves_planes() {
        let planes = vec![vec![1.0, 0.0], vec![0.0, -1.0]];
        assert_eq!(quantize(&planes, 8), vec![127, 0, 0, -127]);
    }

    #[test]
    fn writes_wav_with_configured_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let config = encoder(CODEC_PCM, 16_000, 2, EncodingQuality::Normal);

        write_recording(&path, &sine(48_000, 1, 0.5), &config).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.duration(), 8_000);
    }

    #[test]
    fn writes_flac_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.flac");
        let config = encoder(CODEC_FLAC, 16_000, 1, EncodingQuality::Normal);

        write_recording(&path, &sine(16_000, 1, 1.0), &config).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], b"fLaC");
    }

    #[test]
    fn matching_pcm_take_streams_to_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let config = encoder(CODEC_PCM, 16_000, 2, EncodingQuality::Normal);

        let mut take = TakeWriter::open(&path, &config, 2, 16_000).unwrap();
        assert!(take.is_streaming());
        take.push(&[0.5; 1_600]).unwrap();
        take.push(&[-0.5; 800]).unwrap();
        take.finish().unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().bits_per_sample, 16);
        assert_eq!(reader.duration(), 1_200);
        let first: i32 = reader.samples::<i32>().next().unwrap().unwrap();
        assert_eq!(first, 16_384);
    }

    #[test]
    fn converting_take_is_buffered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let config = encoder(CODEC_PCM, 16_000, 1, EncodingQuality::Normal);

        let mut take = TakeWriter::open(&path, &config, 1, 48_000).unwrap();
        assert!(!take.is_streaming());
        assert!(!path.exists());
        take.push(&sine(48_000, 1, 0.5).samples).unwrap();
        take.finish().unwrap();

        assert_eq!(hound::WavReader::open(&path).unwrap().duration(), 8_000);
    }

    #[test]
    fn flac_take_is_buffered() {
        let dir = tempfile::tempdir().unwrap();
        let config = encoder(CODEC_FLAC, 16_000, 1, EncodingQuality::Normal);
        let take = TakeWriter::open(&dir.path().join("take.flac"), &config, 1, 16_000).unwrap();
        assert!(!take.is_streaming());
    }

    #[test]
    fn empty_streamed_take_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = encoder(CODEC_PCM, 16_000, 1, EncodingQuality::Normal);
        let take = TakeWriter::open(&dir.path().join("take.wav"), &config, 1, 16_000).unwrap();
        assert!(matches!(take.finish(), Err(EncodingError::Empty)));
    }

    #[test]
    fn discarded_take_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let config = encoder(CODEC_PCM, 16_000, 1, EncodingQuality::Normal);

        let mut take = TakeWriter::open(&path, &config, 1, 16_000).unwrap();
        take.push(&[0.1; 160]).unwrap();
        assert!(path.exists());
        take.discard();
        assert!(!path.exists());
    }

    #[test]
    fn empty_capture_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = encoder(CODEC_PCM, 16_000, 1, EncodingQuality::Normal);
        let err = write_recording(&dir.path().join("x.wav"), &CapturedAudio::default(), &config)
            .unwrap_err();
        assert!(matches!(err, EncodingError::Empty));
    }

    #[test]
    fn unknown_codec_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = encoder("audio/mpeg", 16_000, 1, EncodingQuality::Normal);
        let err = write_recording(&dir.path().join("x.mp3"), &sine(16_000, 1, 0.1), &config)
            .unwrap_err();
        assert!(matches!(err, EncodingError::UnsupportedCodec(_)));
    }
}
