//! The snapshot timeline.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::archive::{contents, ArchiveIndex};

use super::backend::{DirectoryBackend, SnapshotBackend};
use super::clock::{Clock, SystemClock};
use super::error::{SnapshotError, SnapshotResult};
use super::id::SnapshotId;

/// How many successor ids [`SnapshotStore::write`] tries before giving up.
const MAX_WRITE_ATTEMPTS: usize = 16;

/// Where the newest snapshot can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLocation {
    /// The snapshot id.
    pub id: SnapshotId,
    /// Full path (or backend location) of the snapshot file.
    pub path: PathBuf,
    /// The id as it appears at the end of the file name.
    pub version_tag: String,
}

impl SnapshotLocation {
    fn new(id: SnapshotId, path: PathBuf) -> Self {
        Self {
            id,
            path,
            version_tag: id.to_string(),
        }
    }

    /// File name of the snapshot.
    pub fn file_name(&self) -> String {
        self.id.file_name()
    }

    /// Delivery reference for clients, relative to `base`.
    ///
    /// ```
    /// use pkgarchive::snapshot::{MemoryBackend, SnapshotStore};
    /// use pkgarchive::archive::ArchiveIndex;
    ///
    /// let store = SnapshotStore::with_backend(MemoryBackend::new());
    /// store.write(&ArchiveIndex::new()).unwrap();
    ///
    /// let location = store.resolve_newest().unwrap();
    /// let url = location.url("https://example.org/packages/");
    /// assert_eq!(
    ///     url,
    ///     format!("https://example.org/packages/archive-contents.{}", location.version_tag)
    /// );
    /// ```
    pub fn url(&self, base: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), self.file_name())
    }
}

/// Append-only sequence of immutable snapshot files.
///
/// Each [`write`](Self::write) produces a file whose id is strictly greater
/// than any id written before it, even if the clock stalls or goes backwards.
/// Readers never need to coordinate with writers: a snapshot only appears
/// under its final name once it is complete.
#[derive(Debug)]
pub struct SnapshotStore {
    backend: Arc<dyn SnapshotBackend>,
    clock: Arc<dyn Clock>,
    last_written: Mutex<Option<SnapshotId>>,
}

impl SnapshotStore {
    /// A store over the directory `dir`, using wall-clock time.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self::with_backend(DirectoryBackend::new(dir))
    }

    /// A store over `backend`, using wall-clock time.
    pub fn with_backend<B: SnapshotBackend + 'static>(backend: B) -> Self {
        Self::new(Arc::new(backend), Arc::new(SystemClock))
    }

    /// A store over an explicit backend and clock.
    pub fn new(backend: Arc<dyn SnapshotBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            last_written: Mutex::new(None),
        }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &Arc<dyn SnapshotBackend> {
        &self.backend
    }

    /// Persist `index` as a new snapshot and return its id.
    pub fn write(&self, index: &ArchiveIndex) -> SnapshotResult<SnapshotId> {
        let body = contents::encode(index);
        let mut last_written = self.last_written.lock();

        let mut id = SnapshotId::from_datetime(self.clock.now());
        for floor in [*last_written, self.newest_id()?].into_iter().flatten() {
            id = id.max(floor.next().ok_or(SnapshotError::IdOverflow(floor))?);
        }

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let file_name = id.file_name();
            if self.backend.create(&file_name, body.as_bytes())? {
                *last_written = Some(id);
                info!(
                    snapshot = %id,
                    packages = index.len(),
                    bytes = body.len(),
                    "Wrote archive snapshot"
                );
                return Ok(id);
            }
            debug!(snapshot = %id, "Snapshot name taken, trying successor");
            id = id.next().ok_or(SnapshotError::IdOverflow(id))?;
        }

        Err(SnapshotError::NameExhausted {
            attempts: MAX_WRITE_ATTEMPTS,
        })
    }

    /// Every snapshot id present, oldest first.
    pub fn list(&self) -> SnapshotResult<Vec<SnapshotId>> {
        let mut ids: Vec<SnapshotId> = self
            .backend
            .list()?
            .iter()
            .filter_map(|name| SnapshotId::from_file_name(name))
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Locate the newest snapshot.
    ///
    /// Returns [`SnapshotError::NoSnapshot`] if nothing has been written yet.
    pub fn resolve_newest(&self) -> SnapshotResult<SnapshotLocation> {
        let id = self.newest_id()?.ok_or(SnapshotError::NoSnapshot)?;
        Ok(self.location(id))
    }

    /// Location of the snapshot `id`, whether or not it exists.
    pub fn location(&self, id: SnapshotId) -> SnapshotLocation {
        SnapshotLocation::new(id, self.backend.location(&id.file_name()))
    }

    /// Read and decode the snapshot `id`.
    pub fn read(&self, id: SnapshotId) -> SnapshotResult<ArchiveIndex> {
        let bytes = self.backend.read(&id.file_name())?;
        let text = String::from_utf8(bytes).map_err(|_| SnapshotError::InvalidEncoding(id))?;
        contents::decode(&text).map_err(|source| SnapshotError::Corrupt { id, source })
    }

    /// Locate and decode the newest snapshot.
    pub fn load_newest(&self) -> SnapshotResult<(SnapshotLocation, ArchiveIndex)> {
        let location = self.resolve_newest()?;
        let index = self.read(location.id)?;
        Ok((location, index))
    }

    fn newest_id(&self) -> SnapshotResult<Option<SnapshotId>> {
        Ok(self
            .backend
            .list()?
            .iter()
            .filter_map(|name| SnapshotId::from_file_name(name))
            .max())
    }
}
