//! Application configuration.

pub mod app_config;
pub mod args;
pub mod storage;

pub use app_config::{AppConfig, LogLevel, NotificationsConfig, ReconnectConfig};
pub use args::{CliArgs, Command, PageArgs};
pub use storage::{ConfigError, StorageManager};
