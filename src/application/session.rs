//! Recording session use case

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::domain::error::SessionError;
use crate::domain::recording::{
    BufferStats, EncoderConfig, ProbedBuffer, RecordingSession, SessionState,
};

use super::ports::{AudioBackend, BackendEvent, ControlGates, OutputFiles, SessionObserver};

/// Drives the audio subsystem from user commands and turns its
/// notifications into observer updates.
///
/// Runs entirely on the event loop; it never blocks and owns no threads.
pub struct RecordingSessionController<A, F, O>
where
    A: AudioBackend,
    F: OutputFiles,
    O: SessionObserver,
{
    backend: A,
    files: F,
    observer: O,
    session: RecordingSession,
    applied: Option<EncoderConfig>,
}

impl<A, F, O> RecordingSessionController<A, F, O>
where
    A: AudioBackend,
    F: OutputFiles,
    O: SessionObserver,
{
    pub fn new(backend: A, files: F, observer: O) -> Self {
        Self {
            backend,
            files,
            observer,
            session: RecordingSession::new(),
            applied: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Settings in effect for the current recording
    pub fn applied_config(&self) -> Option<&EncoderConfig> {
        self.applied.as_ref()
    }

    pub fn backend(&self) -> &A {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut A {
        &mut self.backend
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Start a recording, or resume a paused one.
    ///
    /// Output path, input device and encoder settings are only applied when
    /// the session is stopped; otherwise this just asks the recorder to
    /// record again.
    pub fn start(
        &mut self,
        output_path: &str,
        device: Option<&str>,
        config: &EncoderConfig,
    ) -> Result<SessionState, SessionError> {
        if self.session.is_stopped() {
            if let Err(e) = self.prepare(output_path, device, config) {
                self.observer.alert(&e);
                return Err(e);
            }
        }

        match self.backend.record() {
            Ok(()) => self.session.record(),
            Err(e) => {
                error!(error = %e, "recorder failed to record");
                if self.session.is_stopped() {
                    // Nothing is recording with these settings
                    self.applied = None;
                }
            }
        }
        Ok(self.session.state())
    }

    fn prepare(
        &mut self,
        output_path: &str,
        device: Option<&str>,
        config: &EncoderConfig,
    ) -> Result<(), SessionError> {
        let output = output_path.trim();
        if output.is_empty() {
            return Err(SessionError::Config);
        }

        let path = Path::new(output);
        if self.files.exists(path) {
            self.files
                .remove(path)
                .map_err(|e| SessionError::FileConflict {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?;
            debug!(path = %path.display(), "removed existing output file");
        }

        self.backend.set_output_location(path);
        self.backend.set_audio_input(device);
        if !self.backend.is_available() {
            warn!(device = device.unwrap_or("default"), "audio input not available");
        }

        if let Err(e) = self.backend.set_audio_settings(config) {
            error!(error = %e, settings = %config, "recorder rejected encoder settings");
        }
        self.applied = Some(config.clone());
        info!(path = %path.display(), settings = %config, "recording configured");
        Ok(())
    }

    /// Pause an active recording; ignored in any other state
    pub fn pause(&mut self) -> SessionState {
        if !self.session.is_recording() {
            debug!(state = %self.session.state(), "pause ignored");
            return self.session.state();
        }

        match self.backend.pause() {
            Ok(()) => {
                if let Err(e) = self.session.pause() {
                    debug!(error = %e, "pause ignored");
                }
            }
            Err(e) => error!(error = %e, "recorder failed to pause"),
        }
        self.session.state()
    }

    /// Stop a recording or paused session; ignored when already stopped
    pub fn stop(&mut self) -> SessionState {
        if self.session.is_stopped() {
            debug!("stop ignored, nothing is recording");
            return self.session.state();
        }

        match self.backend.stop() {
            Ok(()) => {
                if let Err(e) = self.session.stop() {
                    debug!(error = %e, "stop ignored");
                }
                self.applied = None;
            }
            Err(e) => error!(error = %e, "recorder failed to stop"),
        }
        self.session.state()
    }

    /// Adopt the recorder's state and update the panel gates
    pub fn on_state_changed(&mut self, state: SessionState) {
        self.session.sync(state);
        if state == SessionState::Stopped {
            self.applied = None;
        }
        debug!(%state, "recorder state changed");
        self.observer.state_changed(ControlGates::for_state(state));
    }

    /// Report elapsed time. The recorder counts milliseconds; the panel
    /// shows whole seconds.
    pub fn on_duration_changed(&mut self, duration_ms: u64) -> u64 {
        let seconds = duration_ms / 1000;
        self.observer.elapsed_changed(seconds);
        seconds
    }

    /// Derive stats from a probed buffer and hand them to the observer
    pub fn on_buffer_probed(&mut self, buffer: &ProbedBuffer) -> BufferStats {
        let stats = BufferStats::from(buffer);
        self.observer.buffer_probed(&stats);
        stats
    }

    /// Route a recorder notification to its handler
    pub fn dispatch(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::StateChanged(state) => self.on_state_changed(state),
            BackendEvent::DurationChanged(ms) => {
                self.on_duration_changed(ms);
            }
            BackendEvent::BufferProbed(buffer) => {
                self.on_buffer_probed(&buffer);
            }
            BackendEvent::Saved(path) => info!(path = %path.display(), "recording saved"),
            BackendEvent::Failed(message) => error!(%message, "recorder failed"),
        }
    }
}
