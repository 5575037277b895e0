//! Audio subsystem adapter using cpal
//!
//! Capture runs on a dedicated thread that owns the `cpal::Stream`
//! (streams are not `Send`). The input callback taps every buffer for the
//! probe, hands the samples to the capture thread unless paused, and
//! reports elapsed time. The capture thread feeds a `TakeWriter`, which
//! streams straight to WAV when no conversion is needed and otherwise
//! encodes the take once the recording stops.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration as StdDuration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SampleRate, SizedSample, StreamConfig};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::encoder::{EncodingError, TakeWriter};
use crate::application::ports::{AudioBackend, BackendError, BackendEvent};
use crate::domain::recording::{
    AudioFormat, ByteOrder, EncoderConfig, ProbedBuffer, SampleType, SessionState, CODEC_FLAC,
    CODEC_PCM,
};

/// Sample rates offered when a device supports them
pub const STANDARD_SAMPLE_RATES: [u32; 9] = [
    8_000, 11_025, 16_000, 22_050, 32_000, 44_100, 48_000, 88_200, 96_000,
];

/// How long `record` waits for the capture thread to open the stream
const STREAM_OPEN_TIMEOUT: StdDuration = StdDuration::from_secs(3);

/// Messages for the capture thread
#[derive(Debug)]
enum CaptureMsg {
    /// Interleaved samples from the input callback
    Samples(Vec<f32>),
    Stop,
    /// `record` gave up waiting; the take must not be written
    Abandon,
}

/// A running capture thread
struct Capture {
    paused: Arc<AtomicBool>,
    control: std_mpsc::Sender<CaptureMsg>,
    thread: JoinHandle<()>,
}

/// Everything the capture thread needs
struct CaptureJob {
    device: Option<String>,
    output: PathBuf,
    settings: EncoderConfig,
    paused: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<BackendEvent>,
    ready_tx: std_mpsc::Sender<Result<(), BackendError>>,
    control_tx: std_mpsc::Sender<CaptureMsg>,
    control_rx: std_mpsc::Receiver<CaptureMsg>,
}

/// Input-side tap feeding both the probe and the recording
struct Tap {
    sink: std_mpsc::Sender<CaptureMsg>,
    paused: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<BackendEvent>,
    format: AudioFormat,
    frames: u64,
}

impl Tap {
    fn push<T>(&mut self, data: &[T])
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        if self.paused.load(Ordering::SeqCst) {
            return;
        }

        let chunk = data.iter().map(|&s| f32::from_sample(s)).collect();
        let _ = self.sink.send(CaptureMsg::Samples(chunk));

        let buffer = ProbedBuffer::from_sample_count(data.len(), self.format.clone());
        self.frames += buffer.frame_count;
        let elapsed_ms = self.frames * 1000 / self.format.sample_rate_hz.max(1) as u64;

        let _ = self.events.send(BackendEvent::BufferProbed(buffer));
        let _ = self.events.send(BackendEvent::DurationChanged(elapsed_ms));
    }
}

/// cpal-backed recorder
pub struct CpalBackend {
    events: mpsc::UnboundedSender<BackendEvent>,
    output: Option<PathBuf>,
    input: Option<String>,
    settings: Option<EncoderConfig>,
    capture: Option<Capture>,
    /// Capture thread still writing a stopped recording
    finishing: Option<JoinHandle<()>>,
}

impl CpalBackend {
    /// Create a backend and the channel its notifications arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BackendEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let backend = Self {
            events,
            output: None,
            input: None,
            settings: None,
            capture: None,
            finishing: None,
        };
        (backend, rx)
    }

    /// Wait for a stopped recording to be written out
    pub fn finish(&mut self) {
        if let Some(thread) = self.finishing.take() {
            if thread.join().is_err() {
                error!("capture thread panicked while writing the recording");
            }
        }
    }

    fn emit(&self, event: BackendEvent) {
        let _ = self.events.send(event);
    }

    /// Find an input device by name, or the default input
    fn find_device(name: Option<&str>) -> Result<cpal::Device, BackendError> {
        let host = cpal::default_host();
        match name {
            None => host.default_input_device().ok_or(BackendError::NoAudioDevice),
            Some(name) => host
                .input_devices()
                .map_err(|e| BackendError::StartFailed(e.to_string()))?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| BackendError::DeviceNotFound(name.to_string())),
        }
    }

    /// Pick a stream config close to the requested settings.
    ///
    /// Prefers a config with the requested channel count and sample rate so
    /// the encoder has less to convert; otherwise uses the device default.
    fn choose_input_config(
        device: &cpal::Device,
        settings: &EncoderConfig,
    ) -> Result<(StreamConfig, SampleFormat), BackendError> {
        let wanted_rate = settings.sample_rate();
        let exact = device.supported_input_configs().ok().and_then(|mut configs| {
            configs.find(|c| {
                c.channels() == settings.channel_count()
                    && c.min_sample_rate().0 <= wanted_rate
                    && c.max_sample_rate().0 >= wanted_rate
                    && sample_type_of(c.sample_format()) != SampleType::Unknown
            })
        });

        let supported = match exact {
            Some(range) => range.with_sample_rate(SampleRate(wanted_rate)),
            None => device
                .default_input_config()
                .map_err(|e| BackendError::StartFailed(format!("Failed to get configs: {}", e)))?,
        };

        Ok((supported.config(), supported.sample_format()))
    }

    fn spawn_capture(&mut self) -> Result<(), BackendError> {
        let output = self
            .output
            .clone()
            .ok_or(BackendError::NotConfigured("output location"))?;
        let settings = self
            .settings
            .clone()
            .ok_or(BackendError::NotConfigured("audio settings"))?;

        // The previous recording may still be writing to the same path
        self.finish();

        let paused = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = std_mpsc::channel();
        let (control, control_rx) = std_mpsc::channel();
        let job = CaptureJob {
            device: self.input.clone(),
            output,
            settings,
            paused: Arc::clone(&paused),
            events: self.events.clone(),
            ready_tx,
            control_tx: control.clone(),
            control_rx,
        };

        let thread = std::thread::Builder::new()
            .name("tapedeck-capture".into())
            .spawn(move || run_capture(job))
            .map_err(|e| BackendError::StartFailed(e.to_string()))?;

        match ready_rx.recv_timeout(STREAM_OPEN_TIMEOUT) {
            Ok(Ok(())) => {
                self.capture = Some(Capture {
                    paused,
                    control,
                    thread,
                });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                // A late open must discard its take; joined by the next finish()
                let _ = control.send(CaptureMsg::Abandon);
                self.finishing = Some(thread);
                Err(BackendError::StartFailed(
                    "audio stream did not open in time".to_string(),
                ))
            }
        }
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        if let Some(capture) = self.capture.take() {
            let _ = capture.control.send(CaptureMsg::Stop);
            self.finishing = Some(capture.thread);
        }
        self.finish();
    }
}

impl AudioBackend for CpalBackend {
    fn audio_inputs(&self) -> Vec<String> {
        match cpal::default_host().input_devices() {
            Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
            Err(e) => {
                warn!(error = %e, "failed to enumerate input devices");
                Vec::new()
            }
        }
    }

    fn default_audio_input(&self) -> Option<String> {
        cpal::default_host()
            .default_input_device()
            .and_then(|d| d.name().ok())
    }

    fn supported_codecs(&self) -> Vec<String> {
        vec![CODEC_PCM.to_string(), CODEC_FLAC.to_string()]
    }

    fn supported_sample_rates(&self) -> Vec<u32> {
        let Ok(device) = Self::find_device(self.input.as_deref()) else {
            return Vec::new();
        };
        let ranges: Vec<_> = match device.supported_input_configs() {
            Ok(configs) => configs.collect(),
            Err(e) => {
                warn!(error = %e, "failed to query supported input configs");
                return Vec::new();
            }
        };

        STANDARD_SAMPLE_RATES
            .into_iter()
            .filter(|&rate| {
                ranges
                    .iter()
                    .any(|r| r.min_sample_rate().0 <= rate && r.max_sample_rate().0 >= rate)
            })
            .collect()
    }

    fn set_output_location(&mut self, path: &Path) {
        self.output = Some(path.to_path_buf());
    }

    fn set_audio_input(&mut self, device: Option<&str>) {
        self.input = device.map(str::to_string);
    }

    fn is_available(&self) -> bool {
        Self::find_device(self.input.as_deref()).is_ok()
    }

    fn set_audio_settings(&mut self, config: &EncoderConfig) -> Result<(), BackendError> {
        if !self.supported_codecs().iter().any(|c| c == config.codec()) {
            return Err(BackendError::UnsupportedCodec(config.codec().to_string()));
        }
        self.settings = Some(config.clone());
        Ok(())
    }

    fn record(&mut self) -> Result<(), BackendError> {
        match &self.capture {
            Some(capture) => {
                if capture.paused.swap(false, Ordering::SeqCst) {
                    debug!("capture resumed");
                    self.emit(BackendEvent::StateChanged(SessionState::Recording));
                }
                Ok(())
            }
            None => {
                self.spawn_capture()?;
                info!("capture started");
                self.emit(BackendEvent::StateChanged(SessionState::Recording));
                Ok(())
            }
        }
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        if let Some(capture) = &self.capture {
            if !capture.paused.swap(true, Ordering::SeqCst) {
                debug!("capture paused");
                self.emit(BackendEvent::StateChanged(SessionState::Paused));
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        if let Some(capture) = self.capture.take() {
            let _ = capture.control.send(CaptureMsg::Stop);
            self.finishing = Some(capture.thread);
            info!("capture stopped");
            self.emit(BackendEvent::StateChanged(SessionState::Stopped));
        }
        Ok(())
    }
}

/// Body of the capture thread
fn run_capture(job: CaptureJob) {
    let CaptureJob {
        device,
        output,
        settings,
        paused,
        events,
        ready_tx,
        control_tx,
        control_rx,
    } = job;

    let opened = CpalBackend::find_device(device.as_deref()).and_then(|device| {
        let (config, sample_format) = CpalBackend::choose_input_config(&device, &settings)?;
        let tap = Tap {
            sink: control_tx,
            paused,
            events: events.clone(),
            format: stream_format(&config, sample_format),
            frames: 0,
        };
        let stream = build_stream(&device, &config, sample_format, tap)?;
        let writer = TakeWriter::open(&output, &settings, config.channels, config.sample_rate.0)
            .map_err(|e| BackendError::WriteFailed(format!("{}: {}", output.display(), e)))?;
        if let Err(e) = stream.play() {
            writer.discard();
            return Err(BackendError::StartFailed(e.to_string()));
        }
        debug!(streaming = writer.is_streaming(), "capture stream open");
        Ok((stream, writer))
    });

    let (stream, writer) = match opened {
        Ok(opened) => opened,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));

    let Some(result) = record_take(stream, &control_rx, writer) else {
        warn!(path = %output.display(), "stream opened after record gave up; take discarded");
        return;
    };
    let event = match result {
        Ok(()) => BackendEvent::Saved(output.clone()),
        Err(e) => BackendEvent::Failed(format!("{}: {}", output.display(), e)),
    };
    let _ = events.send(event);
}

/// Feed `writer` until stopped, then close `stream` and finish the take.
///
/// Returns `None` if the take was abandoned and discarded.
fn record_take<S>(
    stream: S,
    control: &std_mpsc::Receiver<CaptureMsg>,
    mut writer: TakeWriter,
) -> Option<Result<(), EncodingError>> {
    let mut failure = None;
    loop {
        match control.recv() {
            Ok(CaptureMsg::Samples(chunk)) => {
                if let Err(e) = writer.push(&chunk) {
                    failure = Some(e);
                    break;
                }
            }
            Ok(CaptureMsg::Stop) | Err(_) => break,
            Ok(CaptureMsg::Abandon) => {
                drop(stream);
                writer.discard();
                return None;
            }
        }
    }
    drop(stream);

    // Buffers delivered before the stream closed
    while failure.is_none() {
        match control.try_recv() {
            Ok(CaptureMsg::Samples(chunk)) => {
                if let Err(e) = writer.push(&chunk) {
                    failure = Some(e);
                }
            }
            _ => break,
        }
    }

    Some(match failure {
        Some(e) => Err(e),
        None => writer.finish(),
    })
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    sample_format: SampleFormat,
    tap: Tap,
) -> Result<cpal::Stream, BackendError> {
    match sample_format {
        SampleFormat::I8 => input_stream::<i8>(device, config, tap),
        SampleFormat::I16 => input_stream::<i16>(device, config, tap),
        SampleFormat::I32 => input_stream::<i32>(device, config, tap),
        SampleFormat::U8 => input_stream::<u8>(device, config, tap),
        SampleFormat::U16 => input_stream::<u16>(device, config, tap),
        SampleFormat::U32 => input_stream::<u32>(device, config, tap),
        SampleFormat::F32 => input_stream::<f32>(device, config, tap),
        SampleFormat::F64 => input_stream::<f64>(device, config, tap),
        other => Err(BackendError::StartFailed(format!(
            "Unsupported sample format: {}",
            other
        ))),
    }
}

fn input_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut tap: Tap,
) -> Result<cpal::Stream, BackendError>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| tap.push(data),
            |err| error!(error = %err, "audio stream error"),
            None,
        )
        .map_err(|e| BackendError::StartFailed(e.to_string()))
}

/// Format descriptor for buffers coming off a stream
fn stream_format(config: &StreamConfig, sample_format: SampleFormat) -> AudioFormat {
    AudioFormat {
        channel_count: config.channels,
        sample_bits: (sample_format.sample_size() * 8) as u16,
        sample_rate_hz: config.sample_rate.0,
        byte_order: ByteOrder::native(),
        codec: CODEC_PCM.to_string(),
        sample_type: sample_type_of(sample_format),
    }
}

fn sample_type_of(format: SampleFormat) -> SampleType {
    match format {
        SampleFormat::I8 | SampleFormat::I16 | SampleFormat::I32 => SampleType::SignedInt,
        SampleFormat::U8 | SampleFormat::U16 | SampleFormat::U32 => SampleType::UnsignedInt,
        SampleFormat::F32 | SampleFormat::F64 => SampleType::Float,
        _ => SampleType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::{EncodingMode, EncodingQuality};

    fn settings(codec: &str) -> EncoderConfig {
        EncoderConfig::new(
            codec,
            64_000,
            44_100,
            1,
            EncodingQuality::Normal,
            EncodingMode::ConstantQuality,
        )
        .unwrap()
    }

    fn tap(
        paused: bool,
    ) -> (
        Tap,
        mpsc::UnboundedReceiver<BackendEvent>,
        std_mpsc::Receiver<CaptureMsg>,
    ) {
        let (events, rx) = mpsc::unbounded_channel();
        let (sink, samples) = std_mpsc::channel();
        let format = stream_format(
            &StreamConfig {
                channels: 2,
                sample_rate: SampleRate(48_000),
                buffer_size: cpal::BufferSize::Default,
            },
            SampleFormat::I16,
        );
        let tap = Tap {
            sink,
            paused: Arc::new(AtomicBool::new(paused)),
            events,
            format,
            frames: 0,
        };
        (tap, rx, samples)
    }

    #[test]
    fn stream_format_describes_i16_stereo() {
        let (tap, _rx, _samples) = tap(false);
        assert_eq!(tap.format.sample_bits, 16);
        assert_eq!(tap.format.bytes_per_frame(), 4);
        assert_eq!(tap.format.sample_type, SampleType::SignedInt);
        assert_eq!(tap.format.codec, CODEC_PCM);
    }

    #[test]
    fn sample_types_by_format() {
        assert_eq!(sample_type_of(SampleFormat::U8), SampleType::UnsignedInt);
        assert_eq!(sample_type_of(SampleFormat::F32), SampleType::Float);
        assert_eq!(sample_type_of(SampleFormat::I32), SampleType::SignedInt);
    }

    #[test]
    fn tap_reports_and_forwards_samples() {
        let (mut tap, mut rx, samples) = tap(false);
        tap.push(&[i16::MAX; 960]);

        match samples.try_recv().unwrap() {
            CaptureMsg::Samples(chunk) => {
                assert_eq!(chunk.len(), 960);
                assert!((chunk[0] - 1.0).abs() < 1e-3);
            }
            other => panic!("unexpected message: {:?}", other),
        }
        match rx.try_recv().unwrap() {
            BackendEvent::BufferProbed(buffer) => {
                assert_eq!(buffer.frame_count, 480);
                assert_eq!(buffer.byte_count, 1920);
                assert_eq!(buffer.duration_micros, 10_000);
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(rx.try_recv().unwrap(), BackendEvent::DurationChanged(10));
    }

    #[test]
    fn paused_tap_drops_buffers() {
        let (mut tap, mut rx, samples) = tap(true);
        tap.push(&[0i16; 960]);

        assert!(samples.try_recv().is_err());
        assert!(rx.try_recv().is_err());
    }

    fn pcm_take(path: &Path) -> TakeWriter {
        let config = EncoderConfig::new(
            CODEC_PCM,
            64_000,
            16_000,
            1,
            EncodingQuality::Normal,
            EncodingMode::ConstantQuality,
        )
        .unwrap();
        TakeWriter::open(path, &config, 1, 16_000).unwrap()
    }

    #[test]
    fn take_keeps_buffers_queued_behind_stop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let (control, rx) = std_mpsc::channel();
        control.send(CaptureMsg::Samples(vec![0.25; 1_600])).unwrap();
        control.send(CaptureMsg::Stop).unwrap();
        control.send(CaptureMsg::Samples(vec![0.25; 800])).unwrap();

        let result = record_take((), &rx, pcm_take(&path)).unwrap();

        assert!(result.is_ok());
        assert_eq!(hound::WavReader::open(&path).unwrap().duration(), 2_400);
    }

    #[test]
    fn abandoned_take_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let (control, rx) = std_mpsc::channel();
        control.send(CaptureMsg::Samples(vec![0.25; 1_600])).unwrap();
        control.send(CaptureMsg::Abandon).unwrap();

        assert!(record_take((), &rx, pcm_take(&path)).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn take_stopped_before_any_audio_fails_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let (control, rx) = std_mpsc::channel();
        control.send(CaptureMsg::Stop).unwrap();

        let result = record_take((), &rx, pcm_take(&dir.path().join("take.wav"))).unwrap();
        assert!(matches!(result, Err(EncodingError::Empty)));
    }

    #[test]
    fn codecs_are_pcm_and_flac() {
        let (backend, _rx) = CpalBackend::new();
        assert_eq!(backend.supported_codecs(), vec!["audio/pcm", "audio/x-flac"]);
    }

    #[test]
    fn rejects_unknown_codec() {
        let (mut backend, _rx) = CpalBackend::new();
        let err = backend.set_audio_settings(&settings("audio/mpeg")).unwrap_err();
        assert_eq!(err, BackendError::UnsupportedCodec("audio/mpeg".to_string()));
        assert!(backend.set_audio_settings(&settings(CODEC_FLAC)).is_ok());
    }

    #[test]
    fn record_without_configuration_fails() {
        let (mut backend, _rx) = CpalBackend::new();
        let err = backend.record().unwrap_err();
        assert_eq!(err, BackendError::NotConfigured("output location"));
    }

    #[test]
    fn pause_and_stop_without_capture_are_noops() {
        let (mut backend, mut rx) = CpalBackend::new();
        assert!(backend.pause().is_ok());
        assert!(backend.stop().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
