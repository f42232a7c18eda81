//! Common helpers shared across CLI commands.

use pkgarchive::config::ConfigFile;
use pkgarchive::service::ArchiveService;
use pkgarchive::snapshot::SnapshotStore;

use crate::error::CliError;

/// Snapshot store for the configured snapshot directory.
pub fn open_store(config: &ConfigFile) -> SnapshotStore {
    SnapshotStore::open(config.archive.snapshot_dir())
}

/// Service over the configured directories with an empty index.
pub fn open_service(config: &ConfigFile) -> ArchiveService {
    ArchiveService::open(&config.archive.store_dir, config.archive.snapshot_dir())
}

/// Service whose index is loaded from the newest snapshot.
///
/// With no snapshot yet, the store is scanned first so a mutation never
/// publishes an index missing every package already on disk.
pub fn load_service(config: &ConfigFile) -> Result<ArchiveService, CliError> {
    let service = open_service(config);
    if service.restore()?.is_none() {
        tracing::info!("No snapshot yet, scanning package store");
        service.rebuild()?;
    }
    Ok(service)
}
