//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Lockwatch -- bulk vulnerability audit for npm lockfiles.
///
/// Use `lockwatch <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "lockwatch", version, about, long_about = None)]
pub struct Cli {
    /// Path to the lockwatch.toml configuration file.
    #[arg(short, long, global = true, default_value = "lockwatch.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit a package-lock.json against the bulk advisory endpoint.
    Audit(AuditArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- audit ----

/// Submit the dependency set of a lockfile and report advisories.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Lockfile or project directory (default: current directory).
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Exclude entries marked `dev` (overrides `audit.skip_dev_dependencies`).
    #[arg(long)]
    pub skip_dev: bool,

    /// Minimum severity that fails the run (info, low, moderate, high, critical).
    /// Defaults to `audit.min_severity`.
    #[arg(long)]
    pub min_severity: Option<String>,
}

// ---- config ----

/// Manage lockwatch configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, audit).
        #[arg(long)]
        section: Option<String>,
    },
}
