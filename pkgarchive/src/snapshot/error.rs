//! Error types for the snapshot store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::archive::ContentsError;

use super::SnapshotId;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur while writing or resolving snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No snapshot has been written yet.
    ///
    /// Distinct from an empty archive, which is still a valid snapshot.
    #[error("no snapshot available: archive index not yet initialized")]
    NoSnapshot,

    /// Failed to create the snapshot directory.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to read a snapshot or list the directory.
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to write a snapshot.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A snapshot file's contents could not be decoded.
    #[error("snapshot {id} is corrupt: {source}")]
    Corrupt {
        id: SnapshotId,
        #[source]
        source: ContentsError,
    },

    /// A snapshot file is not valid UTF-8.
    #[error("snapshot {0} is not valid UTF-8")]
    InvalidEncoding(SnapshotId),

    /// Every candidate file name was already taken.
    #[error("could not allocate a snapshot name after {attempts} attempts")]
    NameExhausted { attempts: usize },

    /// No id after this one fits in the fixed-width file name.
    #[error("no snapshot id follows {0}")]
    IdOverflow(SnapshotId),
}
