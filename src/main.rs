//! tapedeck CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use tapedeck::cli::{
    app::{load_merged_config, run_panel, validate_config, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    devices::handle_devices_command,
    presenter::Presenter,
};
use tapedeck::infrastructure::{CpalBackend, XdgConfigStore};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Handle subcommands
    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Devices { json }) => {
            let (backend, _events) = CpalBackend::new();
            if let Err(e) = handle_devices_command(&backend, json, &presenter) {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        None => {}
    }

    // Merge config: defaults < file < cli
    let config = load_merged_config(cli.to_config()).await;
    if let Err(e) = validate_config(&config) {
        presenter.error(&format!("Invalid settings: {}", e));
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    run_panel(config, cli.output).await
}
