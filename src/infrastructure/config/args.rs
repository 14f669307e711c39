use super::app_config::LogLevel;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "albumwire",
    version,
    about = "Command-line client for the artist and album catalog",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Catalog API base URL.
    #[arg(long, env = "ALBUMWIRE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Message bus WebSocket URL.
    #[arg(long, env = "ALBUMWIRE_WS_URL", global = true)]
    pub ws_url: Option<String>,

    /// Keep credentials in memory only.
    #[arg(long, global = true)]
    pub no_persist: bool,

    /// Show desktop notifications while watching.
    #[arg(long, global = true)]
    pub desktop_notifications: Option<bool>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session.
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "ALBUMWIRE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and log in as it.
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "ALBUMWIRE_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[arg(long)]
        full_name: Option<String>,
    },

    /// Forget the stored session.
    Logout,

    /// Show the logged-in user.
    Whoami,

    /// List artists.
    Artists {
        #[command(flatten)]
        page: PageArgs,

        /// Filter by name.
        #[arg(long)]
        name: Option<String>,
    },

    /// List albums.
    Albums {
        #[command(flatten)]
        page: PageArgs,

        /// Filter by title.
        #[arg(long)]
        title: Option<String>,

        /// Filter by artist name.
        #[arg(long, conflicts_with = "artist_id")]
        artist: Option<String>,

        /// Filter by artist id.
        #[arg(long)]
        artist_id: Option<i64>,
    },

    /// Stream album notifications until interrupted.
    Watch {
        /// Stop after this many notifications.
        #[arg(long)]
        count: Option<usize>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct PageArgs {
    /// Zero-based page index.
    #[arg(long, default_value_t = 0)]
    pub page: u32,

    /// Page size.
    #[arg(long, default_value_t = 10)]
    pub size: u32,

    /// Sort expression such as `name,desc`.
    #[arg(long)]
    pub sort: Option<String>,
}
