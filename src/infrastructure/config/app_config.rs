//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use crate::infrastructure::realtime::{ChannelConfig, DEFAULT_TOPIC, DEFAULT_WS_URL};

const APP_NAME: &str = "albumwire";
const APP_QUALIFIER: &str = "dev";
const APP_ORGANIZATION: &str = "albumwire";

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(skip)]
    pub log_path: Option<PathBuf>,

    /// Keep credentials in memory only.
    #[serde(skip)]
    pub no_persist: bool,

    /// Catalog API base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Raw WebSocket endpoint of the message bus.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Topic carrying album notifications.
    #[serde(default = "default_topic")]
    pub topic: String,

    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub reconnect: ReconnectConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Backoff policy of the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub jitter_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
            jitter_ms: 0,
        }
    }
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Show a desktop notification per received event.
    #[serde(default = "default_true")]
    pub desktop: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { desktop: true }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_ws_url() -> String {
    DEFAULT_WS_URL.to_string()
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

const fn default_base_delay_ms() -> u64 {
    1000
}

const fn default_max_delay_ms() -> u64 {
    30_000
}

const fn default_max_attempts() -> u32 {
    10
}

const fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(api_url) = &args.api_url {
            self.api_url.clone_from(api_url);
        }
        if let Some(ws_url) = &args.ws_url {
            self.ws_url.clone_from(ws_url);
        }
        if args.no_persist {
            self.no_persist = true;
        }
        if let Some(desktop) = args.desktop_notifications {
            self.notifications.desktop = desktop;
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Notification channel settings derived from `topic` and `[reconnect]`.
    #[must_use]
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig::new()
            .with_topic(self.topic.clone())
            .with_base_delay(Duration::from_millis(self.reconnect.base_delay_ms))
            .with_max_delay(Duration::from_millis(
                self.reconnect.max_delay_ms.max(self.reconnect.base_delay_ms),
            ))
            .with_max_attempts(self.reconnect.max_attempts)
            .with_jitter(Duration::from_millis(self.reconnect.jitter_ms))
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("albumwire.log"))
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            no_persist: false,
            api_url: default_api_url(),
            ws_url: default_ws_url(),
            topic: default_topic(),
            log_level: LogLevel::Info,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            reconnect: ReconnectConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
            api_url = "https://catalog.example.org"
            log_level = "debug"

            [reconnect]
            max_attempts = 3

            [notifications]
            desktop = false
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.api_url, "https://catalog.example.org");
        assert_eq!(config.ws_url, DEFAULT_WS_URL);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.reconnect.max_attempts, 3);
        assert_eq!(config.reconnect.base_delay_ms, 1000);
        assert!(!config.notifications.desktop);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.topic, "/topic/albums");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.notifications.desktop);
        assert_eq!(config.reconnect, ReconnectConfig::default());
    }

    #[test]
    fn test_channel_config_from_reconnect_section() {
        let mut config = AppConfig::default();
        config.reconnect.base_delay_ms = 500;
        config.reconnect.max_delay_ms = 100;

        let channel = config.channel_config();

        assert_eq!(channel.base_delay, Duration::from_millis(500));
        assert_eq!(channel.max_delay, Duration::from_millis(500));
        assert_eq!(channel.max_attempts, 10);
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let args = CliArgs::parse_from([
            "albumwire",
            "--api-url",
            "http://10.0.0.2:8080",
            "--no-persist",
            "--log-level",
            "warn",
            "whoami",
        ]);
        let mut config = AppConfig::default();

        config.merge_with_args(&args);

        assert_eq!(config.api_url, "http://10.0.0.2:8080");
        assert_eq!(config.ws_url, DEFAULT_WS_URL);
        assert!(config.no_persist);
        assert_eq!(config.log_level, LogLevel::Warn);
    }
}
