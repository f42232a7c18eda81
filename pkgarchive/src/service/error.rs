//! Errors returned by archive mutations.

use thiserror::Error;

use crate::archive::ContentsError;
use crate::extract::ExtractionError;
use crate::snapshot::SnapshotError;

/// Result type for [`ArchiveService`](super::ArchiveService) operations.
pub type MutationResult<T> = Result<T, MutationError>;

/// A publish, purge or rebuild that did not complete.
///
/// The in-memory index may already reflect the mutation when this is
/// returned; see [`ArchiveService`](super::ArchiveService).
#[derive(Debug, Error)]
pub enum MutationError {
    /// The serialized descriptor could not be parsed.
    #[error("invalid package entry: {0}")]
    InvalidEntry(#[from] ContentsError),

    /// A package file found while reconciling a purge could not be read.
    #[error("failed to reconcile '{name}' with the package store: {source}")]
    Reconcile {
        name: String,
        #[source]
        source: ExtractionError,
    },

    /// The new snapshot could not be written.
    #[error("failed to write snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The newest snapshot could not be loaded.
    #[error("failed to restore from snapshot: {0}")]
    Restore(#[source] SnapshotError),
}

impl MutationError {
    /// Whether the in-memory index was changed before the failure.
    ///
    /// Parse and restore failures leave the index alone; reconcile and
    /// snapshot write failures happen after the change.
    pub fn index_changed(&self) -> bool {
        !matches!(
            self,
            MutationError::InvalidEntry(_) | MutationError::Restore(_)
        )
    }
}
