//! Immutable, time-ordered archive snapshots.
//!
//! Every write of the archive index produces a new file named
//! `archive-contents.<id>`, where `<id>` is a fixed-width timestamp. Files are
//! never rewritten or removed, so the newest snapshot is simply the file with
//! the greatest name.
//!
//! # Example
//!
//! ```
//! use pkgarchive::archive::ArchiveIndex;
//! use pkgarchive::snapshot::{MemoryBackend, SnapshotError, SnapshotStore};
//!
//! let store = SnapshotStore::with_backend(MemoryBackend::new());
//! assert!(matches!(store.resolve_newest(), Err(SnapshotError::NoSnapshot)));
//!
//! let first = store.write(&ArchiveIndex::new()).unwrap();
//! let second = store.write(&ArchiveIndex::new()).unwrap();
//! assert!(second > first);
//! assert_eq!(store.resolve_newest().unwrap().id, second);
//! ```

mod backend;
mod clock;
mod error;
mod id;
mod store;

pub use backend::{DirectoryBackend, MemoryBackend, SnapshotBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{SnapshotError, SnapshotResult};
pub use id::{SnapshotId, SNAPSHOT_ID_WIDTH, SNAPSHOT_PREFIX};
pub use store::{SnapshotLocation, SnapshotStore};
