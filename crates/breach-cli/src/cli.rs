//! CLI argument definitions

use clap::{Parser, ValueEnum};
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// Bulk-import credential dumps into a database table
#[derive(Parser, Debug)]
#[command(name = "breach-import")]
#[command(version)]
#[command(about = "Bulk-import user/password dumps into a database table")]
#[command(after_help = "The target table needs two string columns named `user` and `pass`.")]
pub struct Cli {
    /// Root directory of the dump, e.g. --path=/data/breachcompilation/data
    #[arg(long, value_name = "DIR", required_unless_present = "doctor")]
    pub path: Option<PathBuf>,

    /// Database to import into, e.g. --database=breach
    #[arg(long, required_unless_present = "doctor")]
    pub database: Option<String>,

    /// Table to import into, e.g. --table=credentials
    #[arg(long, required_unless_present = "doctor")]
    pub table: Option<String>,

    /// Database user (required for the mysql sink)
    #[arg(long = "user", visible_alias = "username", env = "BREACH_IMPORT_USER")]
    pub user: Option<String>,

    /// Database password
    #[arg(long, env = "BREACH_IMPORT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database host
    #[arg(long)]
    pub host: Option<String>,

    /// Database port
    #[arg(long)]
    pub port: Option<u16>,

    /// Records per INSERT statement [default: 500]
    #[arg(long)]
    pub batch_size: Option<NonZeroUsize>,

    /// Characters that separate user from password [default: ":;|"]
    #[arg(long)]
    pub delimiters: Option<String>,

    /// Replace invalid UTF-8 instead of aborting
    #[arg(long)]
    pub lossy_utf8: bool,

    /// Where statements go
    #[arg(long, value_enum, default_value = "mysql")]
    pub sink: SinkKind,

    /// Output file for --sink file
    #[arg(long, short = 'o', required_if_eq("sink", "file"))]
    pub output: Option<PathBuf>,

    /// mysql client binary [default: mysql]
    #[arg(long)]
    pub mysql_bin: Option<String>,

    /// What to do when a batch cannot be delivered [default: abort]
    #[arg(long, value_enum)]
    pub on_error: Option<OnError>,

    /// Extra delivery attempts per batch [default: 0]
    #[arg(long)]
    pub retries: Option<u32>,

    /// Record progress in this journal file
    #[arg(long, env = "BREACH_IMPORT_JOURNAL")]
    pub journal: Option<PathBuf>,

    /// Resume from the journaled position (uses the default journal if --journal is not given)
    #[arg(long)]
    pub resume: bool,

    /// JSON config file with import settings
    #[arg(long, short = 'c', env = "BREACH_IMPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (auto-detects based on TTY if not specified)
    #[arg(long, short = 'f')]
    pub format: Option<OutputFormat>,

    /// Disable color output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Run diagnostics and exit
    #[arg(long)]
    pub doctor: bool,
}

impl Cli {
    /// Get the effective output format
    pub fn effective_format(&self) -> OutputFormat {
        if let Some(f) = self.format {
            return f;
        }
        if atty::is(atty::Stream::Stdout) {
            OutputFormat::Human
        } else {
            OutputFormat::Json
        }
    }

    /// Check if colors should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && atty::is(atty::Stream::Stdout)
    }
}

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output
    Json,
    /// Minimal single-line output
    Minimal,
}

/// Statement destination
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SinkKind {
    /// Pipe each statement through the mysql client
    Mysql,
    /// Write statements to --output for later replay
    File,
    /// Print statements to stdout
    Stdout,
}

/// Failure handling for undeliverable batches
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OnError {
    /// Stop at the first failed batch
    Abort,
    /// Log it and continue with the next batch
    Skip,
}
