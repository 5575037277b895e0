//! CLI layer - Command-line interface
//!
//! Contains argument parsing, panel commands, output formatting,
//! signal handling, and the panel runner.

pub mod app;
pub mod args;
pub mod command;
pub mod config_cmd;
pub mod devices;
pub mod presenter;
pub mod signals;

// Re-export commonly used types
pub use app::{run_panel, PanelApp, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
pub use args::{Cli, Commands, ConfigAction};
pub use command::PanelCommand;
pub use presenter::Presenter;
