// src/config/settings.rs
use std::collections::BTreeMap;
use std::env;

use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::ConfigError;

fn default_timezone() -> String {
    "Europe/Madrid".to_string()
}
fn default_upcoming_minutes() -> u32 {
    60
}
fn default_http_timeout_secs() -> u64 {
    10
}

/// Whole application configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// IANA timezone used for date rendering and the daily window.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Span of the "starting soon" window.
    #[serde(default = "default_upcoming_minutes")]
    pub upcoming_window_minutes: u32,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

/// Credentials shared by every group using a given source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    pub eventbrite: Option<EventbriteCredentials>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventbriteCredentials {
    /// "ENV" means: read from EVENTBRITE_TOKEN
    pub oauth_token: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    pub name: String,
    pub logo: String,
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    /// Fetched in this order.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// Per-group source settings, one variant per source kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Eventbrite(EventbriteSource),
}

impl SourceConfig {
    /// Matches `Fetcher::source_type()` of the fetcher handling it.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Eventbrite(_) => "eventbrite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventbriteSource {
    pub organizer_id: String,
}

/// Per-channel settings, one variant per channel kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelConfig {
    Slack(SlackConfig),
    Telegram(TelegramConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlackConfig {
    /// "ENV" means: read from SLACK_WEBHOOK_URL
    pub webhook_url: String,
    pub name: String,
    pub icon_url: String,
    #[serde(default)]
    pub show_group_thumbs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// "ENV" means: read from TELEGRAM_BOT_TOKEN
    pub token: String,
    pub chat_id: String,
    /// Silent delivery (no sound / vibration on clients).
    #[serde(default)]
    pub disable_notification: bool,
    #[serde(default)]
    pub api_base: Option<String>,
}

impl Settings {
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::validation("timezone", e.to_string()))
    }

    /// Replace "ENV" placeholders with the matching environment variable.
    pub fn resolve_secrets(&mut self) -> Result<(), ConfigError> {
        if let Some(eb) = self.sources.eventbrite.as_mut() {
            resolve_secret(&mut eb.oauth_token, "EVENTBRITE_TOKEN")?;
        }
        for ch in &mut self.channels {
            match ch {
                ChannelConfig::Slack(c) => resolve_secret(&mut c.webhook_url, "SLACK_WEBHOOK_URL")?,
                ChannelConfig::Telegram(c) => resolve_secret(&mut c.token, "TELEGRAM_BOT_TOKEN")?,
            }
        }
        Ok(())
    }

    /// Startup checks: anything missing here would otherwise surface mid-cycle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;

        if self.upcoming_window_minutes == 0 {
            return Err(ConfigError::validation(
                "upcoming_window_minutes",
                "must be greater than zero",
            ));
        }

        for (i, g) in self.groups.iter().enumerate() {
            if g.name.trim().is_empty() {
                return Err(ConfigError::validation(
                    format!("groups[{i}].name"),
                    "cannot be empty",
                ));
            }
            if !g.links.get("web").is_some_and(|w| !w.trim().is_empty()) {
                return Err(ConfigError::validation(
                    format!("groups[{i}].links.web"),
                    format!("group `{}` needs a web link", g.name),
                ));
            }
            for (j, src) in g.sources.iter().enumerate() {
                match src {
                    SourceConfig::Eventbrite(s) => {
                        if s.organizer_id.trim().is_empty() {
                            return Err(ConfigError::validation(
                                format!("groups[{i}].sources[{j}].organizer_id"),
                                "cannot be empty",
                            ));
                        }
                        if self.sources.eventbrite.is_none() {
                            return Err(ConfigError::validation(
                                "sources.eventbrite",
                                format!("group `{}` uses eventbrite but no credentials are set", g.name),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(eb) = &self.sources.eventbrite {
            require("sources.eventbrite.oauth_token", &eb.oauth_token)?;
        }

        for (i, ch) in self.channels.iter().enumerate() {
            match ch {
                ChannelConfig::Slack(c) => {
                    require(&format!("channels[{i}].webhook_url"), &c.webhook_url)?;
                    require(&format!("channels[{i}].name"), &c.name)?;
                }
                ChannelConfig::Telegram(c) => {
                    require(&format!("channels[{i}].token"), &c.token)?;
                    require(&format!("channels[{i}].chat_id"), &c.chat_id)?;
                }
            }
        }

        if self.channels.is_empty() {
            tracing::warn!("no channels configured; digests will not be delivered anywhere");
        }

        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::validation(field, "cannot be empty"));
    }
    Ok(())
}

fn resolve_secret(value: &mut String, var: &'static str) -> Result<(), ConfigError> {
    if value.trim().eq_ignore_ascii_case("env") {
        *value = env::var(var).map_err(|_| ConfigError::MissingEnv(var))?;
    }
    Ok(())
}
