//! Log output setup.
//!
//! The library only emits `tracing` events; binaries call [`init_logging`]
//! once at startup to install a subscriber.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Crates whose events are shown at the configured level.
const LOG_TARGETS: &[&str] = &["pkgarchive", "pkgarchive_cli"];

/// Errors that can occur while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log file's directory could not be created.
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The log file path has no file name.
    #[error("invalid log file path {}", .0.display())]
    InvalidPath(PathBuf),

    /// A global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Raise `base` by one level per `verbose` step, stopping at TRACE.
pub fn effective_level(base: Level, verbose: u8) -> Level {
    const ORDER: [Level; 5] = [
        Level::ERROR,
        Level::WARN,
        Level::INFO,
        Level::DEBUG,
        Level::TRACE,
    ];
    let start = ORDER.iter().position(|l| *l == base).unwrap_or(2);
    let index = (start + verbose as usize).min(ORDER.len() - 1);
    ORDER[index]
}

/// Filter directive enabling `level` for this crate family.
pub fn filter_directive(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the configured level when set. When a log file is
/// configured, events go to it through a background writer; keep the
/// returned guard alive until exit so buffered lines are flushed.
pub fn init_logging(
    settings: &LoggingSettings,
    verbose: u8,
) -> Result<Option<WorkerGuard>, LoggingError> {
    let level = effective_level(settings.level, verbose);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    match &settings.file {
        Some(path) => {
            let (dir, file_name) = split_log_path(path)?;
            std::fs::create_dir_all(dir).map_err(|e| LoggingError::CreateDirectory {
                path: dir.to_path_buf(),
                source: e,
            })?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .try_init()
                .map_err(|e| LoggingError::Install(e.to_string()))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .try_init()
                .map_err(|e| LoggingError::Install(e.to_string()))?;
            Ok(None)
        }
    }
}

fn split_log_path(path: &Path) -> Result<(&Path, &std::ffi::OsStr), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((dir, file_name))
}
