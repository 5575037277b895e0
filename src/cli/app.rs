//! Panel app runner

use std::path::Path;
use std::process::ExitCode;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::application::ports::{
    AudioBackend, BackendEvent, ConfigStore, ControlGates, OutputFiles,
};
use crate::application::{
    ChannelObserver, EditError, PanelChoices, PanelEvent, PanelState,
    RecordingSessionController,
};
use crate::domain::config::AppConfig;
use crate::domain::error::EncoderConfigError;
use crate::domain::recording::{EncoderConfig, EncodingMode, EncodingQuality, SessionState};
use crate::infrastructure::{CpalBackend, LocalFiles, XdgConfigStore};

use super::command::PanelCommand;
use super::presenter::Presenter;
use super::signals::ShutdownSignal;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Whether the event loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The panel: session controller, what it displays, and the terminal
pub struct PanelApp<A: AudioBackend, F: OutputFiles> {
    controller: RecordingSessionController<A, F, ChannelObserver>,
    panel: PanelState,
    presenter: Presenter,
}

impl<A: AudioBackend, F: OutputFiles> PanelApp<A, F> {
    /// Build the panel; controller updates arrive on the returned receiver
    pub fn new(
        backend: A,
        files: F,
        config: &AppConfig,
        output: Option<&str>,
    ) -> (Self, mpsc::UnboundedReceiver<PanelEvent>) {
        let mut panel = PanelState::new(PanelChoices::query(&backend), config);
        if let Some(path) = output {
            if let Err(e) = panel.set_output_path(path) {
                warn!(error = %e, "ignoring output path");
            }
        }

        let (observer, events) = ChannelObserver::channel();
        let app = Self {
            controller: RecordingSessionController::new(backend, files, observer),
            panel,
            presenter: Presenter::new(),
        };
        (app, events)
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    pub fn state(&self) -> SessionState {
        self.controller.state()
    }

    pub fn backend_mut(&mut self) -> &mut A {
        self.controller.backend_mut()
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    /// Hand a recorder notification to the controller
    pub fn on_backend_event(&mut self, event: BackendEvent) {
        if let BackendEvent::Saved(ref path) = event {
            self.presenter.success(&format!("Saved {}", path.display()));
        }
        self.controller.dispatch(event);
    }

    /// Apply a controller update to the panel and redraw
    pub fn on_panel_event(&mut self, event: PanelEvent) {
        let gates_changed = matches!(event, PanelEvent::Gates(_));
        self.panel.apply(event);

        if let Some(alert) = self.panel.take_alert() {
            self.presenter.alert(&alert);
        }
        if gates_changed && self.panel.gates.state != SessionState::Recording {
            self.presenter.info(self.panel.gates.state.as_str());
        }
        self.presenter.render(&self.panel);
    }

    /// Parse and run one line of panel input
    pub fn on_line(&mut self, line: &str) -> Flow {
        match line.parse::<PanelCommand>() {
            Ok(command) => self.execute(command),
            Err(e) => {
                self.presenter.error(&e.to_string());
                Flow::Continue
            }
        }
    }

    /// Run a panel command, honouring the control gates.
    ///
    /// Commands are gated on the controller's state; the panel's copy of the
    /// gates lags behind until the backend's events drain.
    pub fn execute(&mut self, command: PanelCommand) -> Flow {
        let gates = ControlGates::for_state(self.controller.state());
        match command {
            PanelCommand::Start => {
                if !gates.start {
                    self.presenter.warn("Already recording");
                } else {
                    self.start();
                }
            }
            PanelCommand::Pause => {
                if gates.pause {
                    self.controller.pause();
                } else {
                    self.presenter.warn("Not recording");
                }
            }
            PanelCommand::Stop => {
                if gates.stop {
                    self.controller.stop();
                } else {
                    self.presenter.warn("Nothing to stop");
                }
            }
            PanelCommand::Output(_) | PanelCommand::Dir(_) | PanelCommand::Set { .. }
                if !gates.edit_output =>
            {
                self.presenter.error(&EditError::Locked.to_string());
            }
            PanelCommand::Output(path) => {
                let result = self.panel.set_output_path(&path);
                self.report_edit(result, "output");
            }
            PanelCommand::Dir(dir) => {
                let result = self.panel.choose_output_dir(Path::new(&dir));
                self.report_edit(result, "output");
            }
            PanelCommand::Set { field, value } => {
                let result = self.panel.set_field(&field, &value);
                self.report_edit(result, &field);
            }
            PanelCommand::Status => self.presenter.show_panel(&self.panel),
            PanelCommand::Help => self.presenter.help(),
            PanelCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn start(&mut self) {
        let config = match self.panel.encoder_config() {
            Ok(config) => config,
            Err(e) => {
                self.presenter.error(&e.to_string());
                return;
            }
        };

        let device = self.panel.selection.device.clone();
        if let Err(e) = self
            .controller
            .start(&self.panel.output_path, device.as_deref(), &config)
        {
            // Already alerted through the observer
            debug!(error = %e, "start refused");
        }
    }

    fn report_edit<E: std::fmt::Display>(&self, result: Result<(), E>, field: &str) {
        match result {
            Ok(()) if field == "output" => self
                .presenter
                .success(&format!("output = {}", self.panel.output_path)),
            Ok(()) => self.presenter.success(&format!("{} updated", field)),
            Err(e) => self.presenter.error(&e.to_string()),
        }
    }

    /// Stop any active recording before exiting
    pub fn shutdown(&mut self) {
        if self.controller.state() != SessionState::Stopped {
            self.controller.stop();
        }
    }
}

/// Run the interactive panel until quit or a shutdown signal
pub async fn run_panel(config: AppConfig, output: Option<String>) -> ExitCode {
    let (backend, mut backend_events) = CpalBackend::new();
    let (mut app, mut panel_events) = PanelApp::new(backend, LocalFiles, &config, output.as_deref());

    let mut signals = match ShutdownSignal::new().await {
        Ok(s) => s,
        Err(e) => {
            app.presenter()
                .error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    app.presenter().show_panel(app.panel());
    app.presenter().info("Type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            Some(event) = backend_events.recv() => app.on_backend_event(event),
            Some(event) = panel_events.recv() => app.on_panel_event(event),
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if app.on_line(&line) == Flow::Quit {
                        break;
                    }
                }
                Ok(None) | Err(_) => {
                    // Without input only a signal can end an active recording
                    stdin_open = false;
                    if app.state() == SessionState::Stopped {
                        break;
                    }
                }
            },
            Some(reason) = signals.recv() => {
                debug!(?reason, "shutting down");
                break;
            }
        }
    }

    app.shutdown();
    app.backend_mut().finish();
    while let Ok(event) = backend_events.try_recv() {
        app.on_backend_event(event);
    }
    while let Ok(event) = panel_events.try_recv() {
        app.on_panel_event(event);
    }

    ExitCode::from(EXIT_SUCCESS)
}

/// Load and merge configuration from file and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load_or_empty().await;

    // Merge: defaults < file < cli
    AppConfig::defaults().merge(file_config).merge(cli_config)
}

/// Check the merged settings form a valid encoder configuration
pub fn validate_config(config: &AppConfig) -> Result<EncoderConfig, EncoderConfigError> {
    if let Some(ref quality) = config.quality {
        quality.parse::<EncodingQuality>()?;
    }
    if let Some(ref mode) = config.mode {
        mode.parse::<EncodingMode>()?;
    }
    config.encoder_config()
}
