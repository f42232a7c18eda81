//! Error type for CLI commands.

use std::path::PathBuf;

use pkgarchive::config::ConfigError;
use pkgarchive::logging::LoggingError;
use pkgarchive::service::MutationError;
use pkgarchive::snapshot::SnapshotError;
use thiserror::Error;

/// Any failure a command can report. Every variant exits with status 1.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Logging(#[from] LoggingError),

    #[error("{0}")]
    Mutation(#[from] MutationError),

    #[error("{0}")]
    Snapshot(#[from] SnapshotError),

    #[error("failed to read {}: {source}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("package '{0}' is not in the archive")]
    UnknownPackage(String),

    #[error("failed to format output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
