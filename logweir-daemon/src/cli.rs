//! CLI argument definitions for logweir-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Logweir stream routing daemon.
///
/// Loads stream definitions from the catalogue directory, keeps the
/// compiled routing engine in sync, and exposes routing metrics.
#[derive(Parser, Debug)]
#[command(name = "logweird")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to logweir.toml configuration file.
    #[arg(short, long, default_value = "/etc/logweir/logweir.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Override the stream definition directory.
    #[arg(long)]
    pub stream_dir: Option<String>,

    /// Validate configuration and stream definitions, then exit.
    #[arg(long)]
    pub validate: bool,
}
