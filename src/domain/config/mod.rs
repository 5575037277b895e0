//! Application configuration

mod app_config;

pub use app_config::{AppConfig, DEFAULT_FILE_NAME};
