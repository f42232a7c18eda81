//! Authoritative mutations of the archive.
//!
//! [`ArchiveService`] owns the live [`ArchiveIndex`] and is the only way to
//! change it. Every operation mutates the index and writes a new snapshot
//! while holding one lock, so a snapshot never captures a half-applied
//! change and two mutations never interleave.
//!
//! # Failed snapshot writes
//!
//! If the snapshot write fails after the index was mutated, the in-memory
//! index keeps the mutation and the newest snapshot on disk is stale until
//! the next successful mutation or [`ArchiveService::rebuild`]. Nothing is
//! rolled back.

mod error;

pub use error::{MutationError, MutationResult};

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::archive::{build_index, contents, ArchiveIndex, BuildStats};
use crate::extract::{HeaderExtractor, MetadataExtractor};
use crate::package::PackageDescriptor;
use crate::scanner::{ScanWarning, Scanner};
use crate::snapshot::{
    SnapshotError, SnapshotId, SnapshotLocation, SnapshotResult, SnapshotStore,
};

/// Outcome of a full rescan.
#[derive(Debug)]
pub struct RebuildReport {
    /// Snapshot written for the rebuilt index.
    pub snapshot: SnapshotId,
    /// Number of packages in the rebuilt index.
    pub packages: usize,
    /// Extraction and merge counters.
    pub stats: BuildStats,
    /// Entries the scanner skipped.
    pub warnings: Vec<ScanWarning>,
}

/// Outcome of a purge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    /// Snapshot written after the purge.
    pub snapshot: SnapshotId,
    /// The entry that was removed, if the name was indexed.
    pub removed: Option<PackageDescriptor>,
    /// A version still present in the package store that took its place.
    pub restored: Option<PackageDescriptor>,
}

/// Owner of the live archive index.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pkgarchive::extract::HeaderExtractor;
/// use pkgarchive::package::{PackageDescriptor, PackageKind, Version};
/// use pkgarchive::scanner::Scanner;
/// use pkgarchive::service::ArchiveService;
/// use pkgarchive::snapshot::{MemoryBackend, SnapshotStore};
///
/// let service = ArchiveService::new(
///     Scanner::new("/nonexistent/store"),
///     Arc::new(HeaderExtractor::new()),
///     SnapshotStore::with_backend(MemoryBackend::new()),
/// );
///
/// let foo = PackageDescriptor::new("foo", Version::from_slice(&[1, 1]), PackageKind::Single);
/// service.publish(foo.clone()).unwrap();
///
/// assert_eq!(service.get("foo"), Some(foo));
/// assert!(service.resolve_newest().is_ok());
/// ```
pub struct ArchiveService {
    index: Mutex<ArchiveIndex>,
    scanner: Scanner,
    extractor: Arc<dyn MetadataExtractor>,
    store: SnapshotStore,
}

impl ArchiveService {
    /// Create a service with an empty index.
    pub fn new(
        scanner: Scanner,
        extractor: Arc<dyn MetadataExtractor>,
        store: SnapshotStore,
    ) -> Self {
        Self {
            index: Mutex::new(ArchiveIndex::new()),
            scanner,
            extractor,
            store,
        }
    }

    /// Create a service over a store directory and a snapshot directory,
    /// using [`HeaderExtractor`].
    pub fn open(store_dir: impl Into<PathBuf>, snapshot_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            Scanner::new(store_dir),
            Arc::new(HeaderExtractor::new()),
            SnapshotStore::open(snapshot_dir),
        )
    }

    /// Replace the in-memory index without writing a snapshot.
    pub fn with_index(self, index: ArchiveIndex) -> Self {
        *self.index.lock() = index;
        self
    }

    /// The package store scanner.
    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    /// The snapshot store.
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Load the newest snapshot into memory.
    ///
    /// Returns the id that was loaded, or `None` if no snapshot exists yet,
    /// in which case the index is left as it was.
    pub fn restore(&self) -> MutationResult<Option<SnapshotId>> {
        let mut index = self.index.lock();
        match self.store.load_newest() {
            Ok((location, loaded)) => {
                info!(
                    snapshot = %location.id,
                    packages = loaded.len(),
                    "Restored archive index from snapshot"
                );
                *index = loaded;
                Ok(Some(location.id))
            }
            Err(SnapshotError::NoSnapshot) => Ok(None),
            Err(e) => Err(MutationError::Restore(e)),
        }
    }

    /// Rescan the whole package store, replace the index and write a
    /// snapshot.
    pub fn rebuild(&self) -> MutationResult<RebuildReport> {
        let mut index = self.index.lock();

        let scan = self.scanner.scan_all();
        let (rebuilt, stats) = build_index(&scan.candidates, self.extractor.as_ref());
        *index = rebuilt;

        let snapshot = self.store.write(&index)?;
        Ok(RebuildReport {
            snapshot,
            packages: index.len(),
            stats,
            warnings: scan.warnings,
        })
    }

    /// Set the entry for `descriptor.name` to exactly `descriptor`, whatever
    /// version is currently indexed, and write a snapshot.
    ///
    /// A descriptor whose names cannot be written to archive contents is
    /// rejected before the index is touched.
    pub fn publish(&self, descriptor: PackageDescriptor) -> MutationResult<SnapshotId> {
        contents::validate_entry(&descriptor)?;
        let mut index = self.index.lock();

        let summary = descriptor.to_string();
        let previous = index.upsert(descriptor);
        match &previous {
            Some(prev) => info!(package = %summary, previous = %prev.version, "Published package"),
            None => info!(package = %summary, "Published new package"),
        }

        Ok(self.store.write(&index)?)
    }

    /// Parse a single contents entry, `(name . [version reqs summary kind])`,
    /// and [`publish`](Self::publish) it.
    pub fn publish_serialized(&self, entry: &str) -> MutationResult<SnapshotId> {
        let descriptor = contents::parse_entry(entry)?;
        self.publish(descriptor)
    }

    /// Remove `name` from the index, restore any version of it still in the
    /// package store, and write a snapshot.
    ///
    /// If a package file for `name` cannot be read during reconciliation the
    /// removal stands, no snapshot is written and the extraction error is
    /// returned.
    pub fn purge(&self, name: &str) -> MutationResult<PurgeReport> {
        let mut index = self.index.lock();

        let removed = index.remove(name);

        let scan = self.scanner.scan_names(&[name.to_string()]);
        let mut found = Vec::with_capacity(scan.candidates.len());
        for candidate in &scan.candidates {
            let descriptor = self
                .extractor
                .extract(candidate)
                .map_err(|source| MutationError::Reconcile {
                    name: name.to_string(),
                    source,
                })?;
            found.push(descriptor);
        }
        index.merge_all(found);
        let restored = index.get(name).cloned();

        match (&removed, &restored) {
            (_, Some(d)) => info!(package = %name, restored = %d.version, "Purged package; version from store restored"),
            (Some(_), None) => info!(package = %name, "Purged package"),
            (None, None) => warn!(package = %name, "Purge requested for unknown package"),
        }

        let snapshot = self.store.write(&index)?;
        Ok(PurgeReport {
            snapshot,
            removed,
            restored,
        })
    }

    /// A copy of the current index.
    pub fn index(&self) -> ArchiveIndex {
        self.index.lock().clone()
    }

    /// The current entry for `name`.
    pub fn get(&self, name: &str) -> Option<PackageDescriptor> {
        self.index.lock().get(name).cloned()
    }

    /// Locate the newest snapshot. Does not take the index lock.
    pub fn resolve_newest(&self) -> SnapshotResult<SnapshotLocation> {
        self.store.resolve_newest()
    }
}

impl std::fmt::Debug for ArchiveService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveService")
            .field("root", &self.scanner.root())
            .field("packages", &self.index.lock().len())
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{package_path, PackageKind, Version};
    use crate::snapshot::{MemoryBackend, SystemClock};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_single(root: &Path, name: &str, version: &[u64], summary: &str) {
        let path = package_path(root, name, &Version::from_slice(version), PackageKind::Single);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let version = Version::from_slice(version);
        fs::write(
            &path,
            format!(
                ";;; {name}.el --- {summary}\n;; Version: {version}\n;;; Code:\n(provide '{name})\n"
            ),
        )
        .unwrap();
    }

    fn service(root: &Path) -> (ArchiveService, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let store = SnapshotStore::new(backend.clone(), Arc::new(SystemClock));
        let service = ArchiveService::new(Scanner::new(root), Arc::new(HeaderExtractor::new()), store);
        (service, backend)
    }

    fn version(components: &[u64]) -> Version {
        Version::from_slice(components)
    }

    #[test]
    fn test_rebuild_picks_highest_version() {
        let temp = TempDir::new().unwrap();
        write_single(temp.path(), "foo", &[1, 0], "Old foo");
        write_single(temp.path(), "foo", &[1, 2], "New foo");
        write_single(temp.path(), "bar", &[0, 3], "Bar");

        let (service, _) = service(temp.path());
        let report = service.rebuild().unwrap();

        assert_eq!(report.packages, 2);
        assert_eq!(report.stats.candidates(), 3);
        assert_eq!(service.get("foo").unwrap().version, version(&[1, 2]));
        assert_eq!(service.get("foo").unwrap().summary, "New foo");
        assert_eq!(service.resolve_newest().unwrap().id, report.snapshot);
    }

    #[test]
    fn test_rebuild_skips_broken_packages() {
        let temp = TempDir::new().unwrap();
        write_single(temp.path(), "good", &[1], "Good");
        let broken = package_path(temp.path(), "broken", &version(&[1]), PackageKind::Single);
        fs::create_dir_all(broken.parent().unwrap()).unwrap();
        fs::write(&broken, "no header here\n").unwrap();

        let (service, _) = service(temp.path());
        let report = service.rebuild().unwrap();

        assert_eq!(report.packages, 1);
        assert_eq!(report.stats.failures.len(), 1);
        assert!(service.get("broken").is_none());
    }

    #[test]
    fn test_publish_overrides_downward() {
        let temp = TempDir::new().unwrap();
        write_single(temp.path(), "foo", &[1, 2], "Foo");

        let (service, _) = service(temp.path());
        service.rebuild().unwrap();
        assert_eq!(service.get("foo").unwrap().version, version(&[1, 2]));

        let older = PackageDescriptor::new("foo", version(&[1, 1]), PackageKind::Single);
        service.publish(older).unwrap();

        assert_eq!(service.get("foo").unwrap().version, version(&[1, 1]));
        let (_, on_disk) = service.store().load_newest().unwrap();
        assert_eq!(on_disk.get("foo").unwrap().version, version(&[1, 1]));
    }

    #[test]
    fn test_publish_serialized() {
        let temp = TempDir::new().unwrap();
        let (service, _) = service(temp.path());

        service
            .publish_serialized(r#"(foo . [(2 0 1) ((bar (0 3))) "Foo mode" tar])"#)
            .unwrap();

        let foo = service.get("foo").unwrap();
        assert_eq!(foo.version, version(&[2, 0, 1]));
        assert_eq!(foo.kind, PackageKind::Archive);
        assert_eq!(foo.requirements.len(), 1);
    }

    #[test]
    fn test_publish_serialized_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let (service, backend) = service(temp.path());

        let err = service.publish_serialized("(foo . [oops])").unwrap_err();
        assert!(matches!(err, MutationError::InvalidEntry(_)));
        assert!(service.index().is_empty());
        assert!(backend.is_empty());
    }

    #[test]
    fn test_purge_without_files_removes_entry() {
        let temp = TempDir::new().unwrap();
        let (service, _) = service(temp.path());
        service
            .publish(PackageDescriptor::new("foo", version(&[1]), PackageKind::Single))
            .unwrap();

        let report = service.purge("foo").unwrap();

        assert!(report.removed.is_some());
        assert!(report.restored.is_none());
        assert!(service.get("foo").is_none());
        assert!(service.store().read(report.snapshot).unwrap().get("foo").is_none());
    }

    #[test]
    fn test_purge_restores_lower_version_on_disk() {
        let temp = TempDir::new().unwrap();
        write_single(temp.path(), "foo", &[1, 0], "Foo");

        let (service, _) = service(temp.path());
        service.rebuild().unwrap();
        service
            .publish(PackageDescriptor::new("foo", version(&[1, 2]), PackageKind::Single))
            .unwrap();

        let report = service.purge("foo").unwrap();

        assert_eq!(report.removed.unwrap().version, version(&[1, 2]));
        assert_eq!(report.restored.unwrap().version, version(&[1, 0]));
        assert_eq!(service.get("foo").unwrap().version, version(&[1, 0]));
    }

    #[test]
    fn test_purge_leaves_other_packages() {
        let temp = TempDir::new().unwrap();
        write_single(temp.path(), "foo", &[1], "Foo");
        write_single(temp.path(), "bar", &[2], "Bar");

        let (service, _) = service(temp.path());
        service.rebuild().unwrap();
        fs::remove_dir_all(temp.path().join("foo")).unwrap();

        service.purge("foo").unwrap();
        let names: Vec<String> = service.index().names().map(str::to_string).collect();
        assert_eq!(names, vec!["bar".to_string()]);
    }

    #[test]
    fn test_purge_reconcile_failure_keeps_removal() {
        let temp = TempDir::new().unwrap();
        let (service, backend) = service(temp.path());
        service
            .publish(PackageDescriptor::new("foo", version(&[2]), PackageKind::Single))
            .unwrap();
        let before = backend.len();

        let broken = package_path(temp.path(), "foo", &version(&[1]), PackageKind::Single);
        fs::create_dir_all(broken.parent().unwrap()).unwrap();
        fs::write(&broken, "not a package\n").unwrap();

        let err = service.purge("foo").unwrap_err();
        assert!(matches!(err, MutationError::Reconcile { .. }));
        assert!(service.get("foo").is_none());
        assert_eq!(backend.len(), before);
    }

    #[test]
    fn test_failed_snapshot_write_keeps_mutation() {
        let temp = TempDir::new().unwrap();
        let (service, backend) = service(temp.path());
        let first = service
            .publish(PackageDescriptor::new("foo", version(&[1]), PackageKind::Single))
            .unwrap();

        backend.set_fail_writes(true);
        let err = service
            .publish(PackageDescriptor::new("foo", version(&[3]), PackageKind::Single))
            .unwrap_err();

        assert!(matches!(err, MutationError::Snapshot(SnapshotError::WriteFailed { .. })));
        assert_eq!(service.get("foo").unwrap().version, version(&[3]));
        assert_eq!(service.resolve_newest().unwrap().id, first);

        backend.set_fail_writes(false);
        service
            .publish(PackageDescriptor::new("bar", version(&[1]), PackageKind::Single))
            .unwrap();
        let (_, on_disk) = service.store().load_newest().unwrap();
        assert_eq!(on_disk.get("foo").unwrap().version, version(&[3]));
    }

    #[test]
    fn test_restore_loads_newest_snapshot() {
        let temp = TempDir::new().unwrap();
        let (first, backend) = service(temp.path());
        assert_eq!(first.restore().unwrap(), None);

        first
            .publish(PackageDescriptor::new("foo", version(&[1]), PackageKind::Single))
            .unwrap();
        let id = first
            .publish(PackageDescriptor::new("bar", version(&[2]), PackageKind::Archive))
            .unwrap();

        let second = ArchiveService::new(
            Scanner::new(temp.path()),
            Arc::new(HeaderExtractor::new()),
            SnapshotStore::new(backend, Arc::new(SystemClock)),
        );
        assert_eq!(second.restore().unwrap(), Some(id));
        assert_eq!(second.index(), first.index());
    }

    #[test]
    fn test_restore_corrupt_snapshot_leaves_index() {
        let temp = TempDir::new().unwrap();
        let (service, backend) = service(temp.path());
        service
            .publish(PackageDescriptor::new("foo", version(&[1]), PackageKind::Single))
            .unwrap();

        let unreadable: SnapshotId = "99990101000000000000000".parse().unwrap();
        backend.insert(unreadable.file_name(), "(2)\n");

        let err = service.restore().unwrap_err();
        assert!(matches!(
            err,
            MutationError::Restore(SnapshotError::Corrupt { .. })
        ));
        assert!(!err.index_changed());
        assert!(err.to_string().contains("restore"));
        assert!(service.get("foo").is_some());
    }

    #[test]
    fn test_numeric_package_name_survives_restart() {
        let temp = TempDir::new().unwrap();
        write_single(temp.path(), "2048", &[1, 0], "Sliding tiles");
        write_single(temp.path(), "foo", &[1, 2], "Foo");

        let (first, backend) = service(temp.path());
        assert_eq!(first.rebuild().unwrap().packages, 2);

        let second = ArchiveService::new(
            Scanner::new(temp.path()),
            Arc::new(HeaderExtractor::new()),
            SnapshotStore::new(backend, Arc::new(SystemClock)),
        );
        assert!(second.restore().unwrap().is_some());
        assert_eq!(second.index(), first.index());
        assert_eq!(second.get("2048").unwrap().summary, "Sliding tiles");
    }

    #[test]
    fn test_publish_rejects_unwritable_name() {
        let temp = TempDir::new().unwrap();
        let (service, backend) = service(temp.path());

        let err = service
            .publish(PackageDescriptor::new("nil", version(&[1]), PackageKind::Single))
            .unwrap_err();

        assert!(matches!(err, MutationError::InvalidEntry(_)));
        assert!(!err.index_changed());
        assert!(service.index().is_empty());
        assert!(backend.is_empty());
    }

    #[test]
    fn test_concurrent_publishes_serialize() {
        let temp = TempDir::new().unwrap();
        let (service, backend) = service(temp.path());
        let service = Arc::new(service);

        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || {
                    service
                        .publish(PackageDescriptor::new(
                            format!("pkg{}", i),
                            Version::from_slice(&[1, i]),
                            PackageKind::Single,
                        ))
                        .unwrap()
                })
            })
            .collect();

        let mut ids: Vec<SnapshotId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 8);
        assert_eq!(backend.len(), 8);
        let (_, newest) = service.store().load_newest().unwrap();
        assert_eq!(newest.len(), 8);
    }
}
