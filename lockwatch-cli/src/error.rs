//! CLI-specific error types and exit code mapping

use lockwatch_bulk_audit::BulkAuditError;
use lockwatch_core::error::{ConfigError, LockwatchError};

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes so CI jobs can
/// tell "the service is down" from "the dependencies are vulnerable".
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The audit service could not be reached or answered with an error.
    #[error("audit service unavailable: {0}")]
    Transport(String),

    /// The lockfile or the service response did not have the required shape.
    #[error("audit error: {0}")]
    Audit(String),

    /// Advisories at or above the requested severity were reported.
    #[error("{count} advisories at or above {threshold}")]
    Vulnerable { count: usize, threshold: String },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from lockwatch-core.
    #[error("{0}")]
    Core(#[from] LockwatchError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                   |
    /// |------|-------------------------------------------|
    /// | 0    | Success                                   |
    /// | 1    | General / command / audit error           |
    /// | 2    | Configuration error                       |
    /// | 3    | Audit service unreachable                 |
    /// | 4    | Advisories found at or above the threshold |
    /// | 10   | IO error                                  |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(LockwatchError::Config(_)) => 2,
            Self::Transport(_) => 3,
            Self::Vulnerable { .. } => 4,
            Self::Io(_) | Self::Core(LockwatchError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Audit(_) | Self::Core(_) => 1,
        }
    }
}

impl From<BulkAuditError> for CliError {
    fn from(e: BulkAuditError) -> Self {
        match e {
            BulkAuditError::TransportFailure { .. } => Self::Transport(e.to_string()),
            BulkAuditError::Config { .. } => Self::Config(e.to_string()),
            BulkAuditError::Io { path, source } => Self::Io(std::io::Error::new(
                source.kind(),
                format!("{path}: {source}"),
            )),
            other => Self::Audit(other.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::Core(LockwatchError::Config(e))
    }
}
