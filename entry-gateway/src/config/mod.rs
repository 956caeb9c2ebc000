use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub entry_service: EntryServiceSettings,
    /// Directory served at `/` (index.html and the browser assets).
    pub static_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EntryServiceSettings {
    /// Base URL of entry-service, without the `/api` suffix.
    pub url: String,
    /// Only the connect phase is bounded; the live update stream stays open.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn configuration_directory(base_path: &Path) -> PathBuf {
    // Run from the workspace root or from the crate directory.
    if base_path.ends_with("entry-gateway") {
        base_path.join("config")
    } else {
        base_path.join("entry-gateway").join("config")
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;
    load_from(&configuration_directory(&base_path))
}

/// `base.yaml` from `directory`, overridden by `APP_SERVER__PORT` style variables.
pub fn load_from(directory: &Path) -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
