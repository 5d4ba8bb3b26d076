//! Command-line argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// depgate - gate artifact downloads on dependency scan results
#[derive(Parser, Debug)]
#[command(name = "depgate")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "depgate - block repository downloads of artifacts with known vulnerabilities or license issues"
)]
pub struct Cli {
    /// Logging verbosity level
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: LogLevel,

    /// Logging output format
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: crate::logging::LogFormat,

    /// Control color output (auto, always, never). Respects NO_COLOR env var.
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate an artifact against the gate policy
    Evaluate {
        /// Artifact key (repository path), e.g. org/example/1.0/example-1.0.jar
        artifact: String,

        /// Pre-fetched scan report (JSON). Without it the scan service
        /// counts as unavailable and the fail policy decides
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Path to the config file [default: platform config dir]
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Root directory of the artifact property store [default: ~/.depgate/properties]
        #[arg(long)]
        store: Option<PathBuf>,

        /// Package organization (Maven group), when not derivable from the path
        #[arg(long)]
        organization: Option<String>,

        /// Package module name, when not derivable from the path
        #[arg(long)]
        module: Option<String>,

        /// Package revision, when not derivable from the path
        #[arg(long)]
        revision: Option<String>,

        /// Output format: text, json
        #[arg(short = 'F', long, default_value = "text")]
        format: OutputFormat,

        /// Suppress stdout output, only set exit code
        #[arg(short, long)]
        quiet: bool,
    },

    /// Inspect and manage cached decisions
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show the cached decision for an artifact
    Show {
        /// Artifact key (repository path)
        artifact: String,

        /// Root directory of the artifact property store
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Clear the cached decision so the next request rescans
    Clear {
        /// Artifact key (repository path)
        artifact: String,

        /// Root directory of the artifact property store
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Set a force-download override, bypassing one check
    Force {
        /// Which check to override
        kind: OverrideKind,

        /// Artifact key (repository path)
        artifact: String,

        /// Justification recorded next to the override
        #[arg(long)]
        reason: Option<String>,

        /// Root directory of the artifact property store
        #[arg(long)]
        store: Option<PathBuf>,

        /// Path to the config file (for audit settings)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Remove a force-download override
    Unforce {
        /// Which check to stop overriding
        kind: OverrideKind,

        /// Artifact key (repository path)
        artifact: String,

        /// Root directory of the artifact property store
        #[arg(long)]
        store: Option<PathBuf>,

        /// Path to the config file (for audit settings)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize default configuration
    Init {
        /// Path to create config file
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Show current configuration
    Show,
}

/// Logging verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Which gate check a force-download override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OverrideKind {
    Vulnerabilities,
    Licenses,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Evaluate exit codes with distinct semantics.
/// 0 = allow, 1 = deny (policy violation), 2 = error (gate failure).
pub const EXIT_ALLOW: u8 = 0;
pub const EXIT_DENY: u8 = 1;
pub const EXIT_ERROR: u8 = 2;

/// Default property store root under the user's home.
pub fn default_store_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".depgate")
        .join("properties")
}
