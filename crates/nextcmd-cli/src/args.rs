use clap::{Parser, Subcommand, ValueEnum};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[derive(Parser)]
#[command(name = "nextcmd")]
#[command(about = "Debugging driver for the nextcmd suggestion engine", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Daemon data directory. Defaults to NEXTCMD_PATH, then the platform
    /// data directory, then ~/.nextcmd (§6.4).
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(long, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Recompute command_stats/transition_stats/failure_recovery from
    /// retained raw events (§4.7) and exit.
    #[arg(long)]
    pub rebuild_aggregates: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Status of daemon, store, and caches (§6.5).
    Status,
    /// Debugging driver into the request orchestrator (§6.5, §4.9).
    Suggest {
        /// Shell session id to suggest for. Synthetic ids are fine for debugging.
        #[arg(long, default_value = "nextcmd-cli")]
        session_id: String,
        /// Working directory the request is scoped to. Defaults to the current directory.
        #[arg(long)]
        cwd: Option<String>,
        /// Current command-line buffer contents.
        #[arg(long, default_value = "")]
        buffer: String,
        /// Cursor position within `buffer`. Defaults to the end of the buffer.
        #[arg(long)]
        cursor_pos: Option<usize>,
        #[arg(long, default_value_t = 10)]
        limit: u32,
        /// Print each suggestion's contributing reasons.
        #[arg(long)]
        explain: bool,
    },
}
