//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::domain::error::ConfigError;
use crate::domain::recording::{EncodingMode, EncodingQuality, CHANNEL_OPTIONS};

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load().await?;
    apply_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    match read_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = read_value(&config, key);
        presenter.key_value(key, value.as_deref().unwrap_or(NOT_SET));
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

/// Validate `value` for `key` and store it in `config`
fn apply_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::ValidationError {
        key: key.to_string(),
        message,
    };

    match key {
        "device" => config.device = Some(value.to_string()),
        "codec" => {
            if value.trim().is_empty() {
                return Err(invalid("Codec must not be empty".to_string()));
            }
            config.codec = Some(value.to_string());
        }
        "sample_rate" => config.sample_rate = Some(parse_positive(value).map_err(invalid)?),
        "bit_rate" => config.bit_rate = Some(parse_positive(value).map_err(invalid)?),
        "channels" => {
            let channels = value
                .parse::<u16>()
                .ok()
                .filter(|n| CHANNEL_OPTIONS.contains(n))
                .ok_or_else(|| {
                    invalid(format!(
                        "Invalid value '{}'. Valid options: {}",
                        value,
                        join(&CHANNEL_OPTIONS)
                    ))
                })?;
            config.channels = Some(channels);
        }
        "quality" => {
            let quality = value
                .parse::<EncodingQuality>()
                .map_err(|e| invalid(e.to_string()))?;
            config.quality = Some(quality.to_string());
        }
        "mode" => {
            let mode = value
                .parse::<EncodingMode>()
                .map_err(|e| invalid(e.to_string()))?;
            config.mode = Some(mode.to_string());
        }
        "output_dir" => config.output_dir = Some(value.to_string()),
        "file_name" => {
            if value.trim().is_empty() {
                return Err(invalid("File name must not be empty".to_string()));
            }
            config.file_name = Some(value.to_string());
        }
        _ => unreachable!(), // Already validated
    }
    Ok(())
}

fn read_value(config: &AppConfig, key: &str) -> Option<String> {
    match key {
        "device" => config.device.clone(),
        "codec" => config.codec.clone(),
        "sample_rate" => config.sample_rate.map(|n| n.to_string()),
        "bit_rate" => config.bit_rate.map(|n| n.to_string()),
        "channels" => config.channels.map(|n| n.to_string()),
        "quality" => config.quality.clone(),
        "mode" => config.mode.clone(),
        "output_dir" => config.output_dir.clone(),
        "file_name" => config.file_name.clone(),
        _ => None,
    }
}

fn parse_positive(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Value must be a positive integer, got '{}'", value)),
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
