//! CLI presenter for output formatting

use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::PanelState;
use crate::domain::recording::{BufferStats, SessionState};

const PANEL_HELP: &str = "\
Commands:
  start, r                 start recording, or resume when paused
  pause, p                 pause the recording
  stop, s                  stop and save the recording
  output <file>            set the output file
  dir <directory>          write the output file into a directory
  set <field> <value>      change device, codec, rate, channels, bitrate, quality or mode
  status                   show the panel
  help                     show this help
  quit, q                  stop and exit";

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.red} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print a line to stderr without tearing the spinner
    fn print(&self, line: String) {
        match self.spinner {
            Some(ref spinner) => spinner.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        self.print(format!("{} {}", "ℹ".cyan(), message));
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        self.print(format!("{} {}", "✓".green(), message));
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        self.print(format!("{} {}", "⚠".yellow(), message));
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        self.print(format!("{} {}", "✗".red(), message));
    }

    /// Show an alert raised by the session
    pub fn alert(&self, message: &str) {
        self.print(format!("{} {}", "✗ Alert:".red().bold(), message));
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Reflect the panel's live state in the spinner line
    pub fn render(&mut self, panel: &PanelState) {
        match panel.gates.state {
            SessionState::Stopped => self.stop_spinner(),
            SessionState::Recording | SessionState::Paused => {
                let line = format_status_line(panel);
                if self.spinner.is_some() {
                    self.update_spinner(&line);
                } else {
                    self.start_spinner(&line);
                }
            }
        }
    }

    /// Print the full panel: settings, output and available actions
    pub fn show_panel(&self, panel: &PanelState) {
        let selection = &panel.selection;
        let device = selection
            .device
            .as_deref()
            .or(panel.choices.default_device.as_deref())
            .unwrap_or("(none)");
        let mut lines = vec![
            format!("{} {}", "●".cyan(), panel.gates.state.as_str().bold()),
            format!("  {:<9}{}", "device", device),
            format!("  {:<9}{}", "codec", selection.codec),
            format!("  {:<9}{} Hz", "rate", selection.sample_rate),
            format!("  {:<9}{}", "channels", selection.channels),
            format!("  {:<9}{} bps", "bitrate", selection.bit_rate),
            format!(
                "  {:<9}{} ({}/{})",
                "quality",
                selection.quality,
                selection.quality.level(),
                panel.choices.max_quality_level
            ),
            format!("  {:<9}{}", "mode", selection.mode),
            format!("  {:<9}{}", "output", panel.output_path),
            format!("  {:<9}{}", "elapsed", format_elapsed(panel.elapsed_secs)),
        ];
        if let Some(ref stats) = panel.stats {
            lines.push(format!("  {:<9}{}", "buffer", format_stats(stats)));
        }
        lines.push(format!("  {:<9}{}", "actions", format_actions(panel)));
        self.print(lines.join("\n"));
    }

    /// Print the list of panel commands
    pub fn help(&self) {
        self.print(PANEL_HELP.to_string());
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Elapsed seconds as `mm:ss`, or `h:mm:ss` past the hour
pub fn format_elapsed(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

/// One-line summary of the last probed buffer
pub fn format_stats(stats: &BufferStats) -> String {
    format!(
        "{} {} Hz {}ch {}-bit {} {} | {} B {} frames {} samples {} ms ({} B/frame)",
        stats.codec_name,
        stats.sample_rate_hz,
        stats.channel_count,
        stats.sample_bits,
        stats.sample_type,
        stats.byte_order,
        stats.byte_count,
        stats.frame_count,
        stats.sample_count,
        stats.duration_millis(),
        stats.bytes_per_frame
    )
}

fn format_actions(panel: &PanelState) -> String {
    let gates = &panel.gates;
    let mut actions = Vec::new();
    if gates.start {
        actions.push(if gates.state == SessionState::Paused {
            "resume"
        } else {
            "start"
        });
    }
    if gates.pause {
        actions.push("pause");
    }
    if gates.stop {
        actions.push("stop");
    }
    if gates.edit_output {
        actions.push("output/dir/set");
    }
    actions.join(", ")
}

/// Spinner line while recording or paused
pub fn format_status_line(panel: &PanelState) -> String {
    let label = match panel.gates.state {
        SessionState::Recording => "REC".red().bold(),
        _ => "PAUSED".yellow().bold(),
    };
    let mut line = format!("{} {}", label, format_elapsed(panel.elapsed_secs));
    if let Some(ref stats) = panel.stats {
        line.push_str(" | ");
        line.push_str(&format_stats(stats));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{PanelChoices, PanelEvent};
    use crate::application::ports::ControlGates;
    use crate::domain::config::AppConfig;
    use crate::domain::recording::{ByteOrder, SampleType};

    fn stats() -> BufferStats {
        BufferStats {
            byte_count: 4096,
            duration_micros: 23_219,
            frame_count: 1024,
            sample_count: 2048,
            channel_count: 2,
            sample_bits: 16,
            sample_rate_hz: 44_100,
            bytes_per_frame: 4,
            byte_order: ByteOrder::Little,
            codec_name: "audio/pcm".to_string(),
            sample_type: SampleType::SignedInt,
        }
    }

    fn panel_in(state: SessionState) -> PanelState {
        let mut panel = PanelState::new(PanelChoices::default(), &AppConfig::defaults());
        panel.apply(PanelEvent::Gates(ControlGates::for_state(state)));
        panel
    }

    #[test]
    fn format_elapsed_minutes() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(75), "01:15");
        assert_eq!(format_elapsed(3_725), "1:02:05");
    }

    #[test]
    fn format_stats_shows_millis() {
        let line = format_stats(&stats());
        assert!(line.contains("4096 B"));
        assert!(line.contains("1024 frames"));
        assert!(line.contains("23 ms"));
        assert!(line.contains("44100 Hz 2ch 16-bit"));
    }

    #[test]
    fn status_line_includes_elapsed_and_stats() {
        let mut panel = panel_in(SessionState::Recording);
        panel.apply(PanelEvent::Elapsed(12));
        panel.apply(PanelEvent::Stats(stats()));

        let line = format_status_line(&panel);
        assert!(line.contains("00:12"));
        assert!(line.contains("2048 samples"));
    }

    #[test]
    fn actions_follow_gates() {
        assert_eq!(format_actions(&panel_in(SessionState::Stopped)), "start, output/dir/set");
        assert_eq!(format_actions(&panel_in(SessionState::Recording)), "pause, stop");
        assert_eq!(format_actions(&panel_in(SessionState::Paused)), "resume, stop");
    }
}
