// src/config/mod.rs
pub mod settings;

use std::fs;
use std::path::{Path, PathBuf};

pub use settings::{
    ChannelConfig, EventbriteCredentials, EventbriteSource, GroupConfig, Settings, SlackConfig,
    SourceConfig, SourcesConfig, TelegramConfig,
};

use crate::error::ConfigError;

pub const ENV_CONFIG_PATH: &str = "EVENT_DIGEST_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/event-digest.toml";

/// Parse, resolve "ENV" secrets and validate.
pub fn parse_settings(s: &str) -> Result<Settings, ConfigError> {
    let mut settings: Settings = toml::from_str(s)?;
    settings.resolve_secrets()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from an explicit path.
pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let settings = parse_settings(&content)?;
    tracing::info!(
        path = %path.display(),
        groups = settings.groups.len(),
        channels = settings.channels.len(),
        "config loaded"
    );
    Ok(settings)
}

/// Resolve the config path:
/// 1) $EVENT_DIGEST_CONFIG
/// 2) config/event-digest.toml
pub fn default_path() -> PathBuf {
    std::env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}
