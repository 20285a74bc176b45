//! Application settings loading from config.toml
//!
//! Every section is optional. A missing file yields [`AppConfig::default`], so
//! the service starts with sensible values on a fresh checkout.

use super::categories::CategoryConfig;
use crate::errors::{Error, Result};
use chrono::Weekday;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "CLINK_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Outgoing email settings
    pub email: EmailConfig,
    /// Background job settings
    pub scheduler: SchedulerConfig,
    /// Categories to seed; the built-in catalog is used when empty
    pub categories: Vec<CategoryConfig>,
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Which [`crate::emails::mailer::Mailer`] to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransport {
    /// Write messages to the log without delivering them
    #[default]
    Log,
    /// Keep messages in memory
    Outbox,
    /// Deliver through the `[email.smtp]` relay
    Smtp,
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Upgrade a plain connection with STARTTLS
    #[default]
    Starttls,
    /// TLS from the first byte (usually port 465)
    Tls,
    /// No encryption, for local relays only
    Plain,
}

/// `[email.smtp]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Relay host name
    pub host: String,
    /// Relay port
    pub port: u16,
    /// Connection security
    pub security: SmtpSecurity,
    /// Login name, when the relay requires authentication
    pub username: Option<String>,
    /// Password; `SMTP_PASSWORD` is used when this is unset
    pub password: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            security: SmtpSecurity::Starttls,
            username: None,
            password: None,
        }
    }
}

/// `[email]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Sender address
    pub from_address: String,
    /// Delivery backend
    pub transport: MailTransport,
    /// Relay settings used by [`MailTransport::Smtp`]
    pub smtp: SmtpConfig,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_address: "noreply@clinkfinance.local".to_string(),
            transport: MailTransport::Log,
            smtp: SmtpConfig::default(),
        }
    }
}

/// `[scheduler]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Run background jobs at all
    pub enabled: bool,
    /// Seconds between scheduler ticks
    pub tick_seconds: u64,
    /// Day the weekly emails go out, e.g. `"sun"` or `"Sunday"`
    pub weekly_day: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_seconds: 3600,
            weekly_day: "sun".to_string(),
        }
    }
}

impl SchedulerConfig {
    /// Parses [`Self::weekly_day`].
    pub fn weekly_weekday(&self) -> Result<Weekday> {
        self.weekly_day.parse::<Weekday>().map_err(|_| Error::Config {
            message: format!("Invalid scheduler.weekly_day: {}", self.weekly_day),
        })
    }
}

/// Loads configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.scheduler.weekly_weekday()?;
    Ok(config)
}

/// Loads configuration from `$CLINK_CONFIG` or `./config.toml`.
///
/// A missing file is not an error; defaults are returned instead.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    if Path::new(&path).exists() {
        info!(path = %path, "Loading configuration");
        load_config(&path)
    } else {
        warn!(path = %path, "Config file not found, using defaults");
        Ok(AppConfig::default())
    }
}
