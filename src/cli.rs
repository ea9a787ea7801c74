mod help_text;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Keep local Hexabase scripts and projects in sync
#[derive(Parser, Debug)]
#[command(name = "hxutil", version, about, long_about = help_text::ROOT_LONG_ABOUT)]
pub struct Cli {
    /// Increase logging verbosity (-v info, -vv debug). Takes precedence over RUST_LOG.
    #[arg(short, long, action = ArgAction::Count, global = true, conflicts_with = "log_level")]
    pub verbose: u8,

    /// Set the log level explicitly. Takes precedence over RUST_LOG.
    #[arg(long, value_name = "LEVEL", value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Config file to use instead of ~/.config/hxutil/config.toml
    #[arg(long, value_name = "PATH", env = "HXUTIL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// API base URL, overriding the configured one
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and print the session token
    Login {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Work with action and function scripts
    #[command(subcommand)]
    Action(ActionCommand),

    /// Work with whole projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Call the API directly
    #[command(subcommand)]
    Api(ApiCommand),

    /// Inspect the configuration file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ActionCommand {
    /// Compare local script files with the scripts of a project
    #[command(long_about = help_text::ACTION_DIFF_LONG_ABOUT)]
    Diff {
        /// Root directory of the local scripts
        #[arg(long, value_name = "PATH", default_value = ".")]
        dir: PathBuf,

        /// Project ID (defaults to the last used project)
        #[arg(short, long, value_name = "P_ID")]
        project: Option<String>,

        /// Wait for Enter after each difference
        #[arg(long, conflicts_with = "no_pause")]
        pause: bool,

        /// Never wait after a difference, even if the config says so
        #[arg(long)]
        no_pause: bool,

        #[command(flatten)]
        credentials: Credentials,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Compare settings, functions and actions of two projects
    #[command(long_about = help_text::PROJECT_DIFF_LONG_ABOUT)]
    Diff {
        /// First project ID (A)
        #[arg(value_name = "P_ID_A")]
        project_a: String,

        /// Second project ID (B)
        #[arg(value_name = "P_ID_B")]
        project_b: String,

        /// Environment variable values longer than this are diffed rather than
        /// compared for equality
        #[arg(long, value_name = "N")]
        large_value_threshold: Option<usize>,

        #[command(flatten)]
        credentials: Credentials,
    },
}

#[derive(Subcommand, Debug)]
pub enum ApiCommand {
    /// Send one request and print the response
    Call {
        /// Request path, e.g. /api/v0/workspaces
        #[arg(value_name = "URI")]
        uri: String,

        #[arg(short, long, value_enum, default_value_t = HttpMethod::Get)]
        method: HttpMethod,

        /// JSON request body (POST only)
        #[arg(short, long, value_name = "JSON")]
        body: Option<String>,

        /// Log in first and send the session token
        #[arg(short, long)]
        auth: bool,

        #[command(flatten)]
        credentials: Credentials,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the location of the config file
    Path,
    /// Print the loaded configuration with passwords masked
    Show,
}

#[derive(Args, Debug, Clone, Default)]
pub struct Credentials {
    /// Login email (defaults to the last login user)
    #[arg(long, value_name = "EMAIL", env = "HXUTIL_EMAIL")]
    pub email: Option<String>,

    /// Login password (prompted for if not given)
    #[arg(long, value_name = "PASSWORD", env = "HXUTIL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
