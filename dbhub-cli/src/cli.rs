//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::CONFIG_FILE_NAME;

/// dbhub CLI - check database connection configurations
#[derive(Parser, Debug)]
#[command(name = "dbhub")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "dbhub CLI - check database connection configurations", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log level for the dbhub crates (overrides DBHUB_LOG_LEVEL)
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open every connection of a config file, list the aliases and close them
    Check(CheckArgs),

    /// Show how a connection string is parsed and named
    Parse(ParseArgs),

    /// Display version information
    Version,
}

/// Log levels accepted by `--log-level`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Level name understood by the log filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

// =============================================================================
// Check Command
// =============================================================================

/// Arguments for the `check` command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the configuration file
    #[arg(short, long, env = "DBHUB_CONFIG", default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Override the connect timeout of the primary-driver entry, in seconds
    #[arg(short, long)]
    pub timeout: Option<u64>,
}

// =============================================================================
// Parse Command
// =============================================================================

/// Arguments for the `parse` command
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Connection string to parse
    pub connection_string: String,

    /// Names to resolve against the connection string (e.g. wtb:main,catalog)
    #[arg(short, long, value_delimiter = ',')]
    pub name: Vec<String>,

    /// Separator between database and alias in names
    #[arg(short, long, default_value = ":")]
    pub separator: String,
}
