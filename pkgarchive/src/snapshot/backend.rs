//! Storage for snapshot files.
//!
//! A backend only knows about file names and bytes. [`SnapshotBackend::create`]
//! must never replace an existing file and must make the file visible under
//! its final name all at once, so readers either see a complete snapshot or
//! none.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use super::error::{SnapshotError, SnapshotResult};

/// A place snapshot files live.
pub trait SnapshotBackend: Send + Sync + fmt::Debug {
    /// Names of every file in the backend, in no particular order.
    ///
    /// A backend that has never been written to lists as empty.
    fn list(&self) -> SnapshotResult<Vec<String>>;

    /// Create `file_name` with `contents`.
    ///
    /// Returns `Ok(false)` without writing anything if the name is taken.
    fn create(&self, file_name: &str, contents: &[u8]) -> SnapshotResult<bool>;

    /// Read the whole of `file_name`.
    fn read(&self, file_name: &str) -> SnapshotResult<Vec<u8>>;

    /// Where `file_name` lives, for reporting to callers.
    fn location(&self, file_name: &str) -> PathBuf;
}

/// Snapshot files in a directory on the local filesystem.
///
/// Files are staged as hidden temporaries in the same directory and then
/// linked into place without clobbering, so a partially written snapshot is
/// never visible under a snapshot name.
#[derive(Debug, Clone)]
pub struct DirectoryBackend {
    dir: PathBuf,
}

impl DirectoryBackend {
    /// Use `dir` for snapshots. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The snapshot directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn stage(&self, contents: &[u8]) -> io::Result<NamedTempFile> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(contents)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }
}

impl SnapshotBackend for DirectoryBackend {
    fn list(&self) -> SnapshotResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SnapshotError::ReadFailed {
                    path: self.dir.clone(),
                    source: e,
                })
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SnapshotError::ReadFailed {
                path: self.dir.clone(),
                source: e,
            })?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn create(&self, file_name: &str, contents: &[u8]) -> SnapshotResult<bool> {
        fs::create_dir_all(&self.dir).map_err(|e| SnapshotError::CreateDirectoryFailed {
            path: self.dir.clone(),
            source: e,
        })?;

        let target = self.dir.join(file_name);
        let tmp = self.stage(contents).map_err(|e| SnapshotError::WriteFailed {
            path: target.clone(),
            source: e,
        })?;

        match tmp.persist_noclobber(&target) {
            Ok(_) => Ok(true),
            // The temporary is removed when the returned handle drops.
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(SnapshotError::WriteFailed {
                path: target,
                source: err.error,
            }),
        }
    }

    fn read(&self, file_name: &str) -> SnapshotResult<Vec<u8>> {
        let path = self.dir.join(file_name);
        fs::read(&path).map_err(|e| SnapshotError::ReadFailed { path, source: e })
    }

    fn location(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

/// Snapshot files held in memory.
///
/// Writes can be made to fail on demand, which is how callers exercise their
/// handling of a snapshot write error.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent [`create`](SnapshotBackend::create) fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Place a file directly, bypassing the no-clobber rule.
    pub fn insert(&self, file_name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.lock().insert(file_name.into(), contents.into());
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    /// Whether no files are stored.
    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl SnapshotBackend for MemoryBackend {
    fn list(&self) -> SnapshotResult<Vec<String>> {
        Ok(self.files.lock().keys().cloned().collect())
    }

    fn create(&self, file_name: &str, contents: &[u8]) -> SnapshotResult<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SnapshotError::WriteFailed {
                path: self.location(file_name),
                source: io::Error::new(io::ErrorKind::Other, "writes disabled"),
            });
        }

        let mut files = self.files.lock();
        if files.contains_key(file_name) {
            return Ok(false);
        }
        files.insert(file_name.to_string(), contents.to_vec());
        Ok(true)
    }

    fn read(&self, file_name: &str) -> SnapshotResult<Vec<u8>> {
        self.files
            .lock()
            .get(file_name)
            .cloned()
            .ok_or_else(|| SnapshotError::ReadFailed {
                path: self.location(file_name),
                source: io::Error::new(io::ErrorKind::NotFound, "no such snapshot"),
            })
    }

    fn location(&self, file_name: &str) -> PathBuf {
        PathBuf::from("memory").join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_list_missing_dir_is_empty() {
        let temp = TempDir::new().unwrap();
        let backend = DirectoryBackend::new(temp.path().join("not-yet"));
        assert!(backend.list().unwrap().is_empty());
    }

    #[test]
    fn test_directory_create_and_read() {
        let temp = TempDir::new().unwrap();
        let backend = DirectoryBackend::new(temp.path().join("snapshots"));

        assert!(backend.create("archive-contents.1", b"(1)\n").unwrap());
        assert_eq!(backend.read("archive-contents.1").unwrap(), b"(1)\n");
        assert_eq!(backend.list().unwrap(), vec!["archive-contents.1".to_string()]);
        assert_eq!(
            backend.location("archive-contents.1"),
            temp.path().join("snapshots").join("archive-contents.1")
        );
    }

    #[test]
    fn test_directory_create_does_not_clobber() {
        let temp = TempDir::new().unwrap();
        let backend = DirectoryBackend::new(temp.path());

        assert!(backend.create("snap", b"first").unwrap());
        assert!(!backend.create("snap", b"second").unwrap());
        assert_eq!(backend.read("snap").unwrap(), b"first");
    }

    #[test]
    fn test_directory_create_leaves_no_temporaries() {
        let temp = TempDir::new().unwrap();
        let backend = DirectoryBackend::new(temp.path());

        backend.create("snap", b"first").unwrap();
        backend.create("snap", b"second").unwrap();

        assert_eq!(backend.list().unwrap(), vec!["snap".to_string()]);
    }

    #[test]
    fn test_directory_read_missing() {
        let temp = TempDir::new().unwrap();
        let backend = DirectoryBackend::new(temp.path());
        assert!(matches!(
            backend.read("absent"),
            Err(SnapshotError::ReadFailed { .. })
        ));
    }

    #[test]
    fn test_memory_backend() {
        let backend = MemoryBackend::new();
        assert!(backend.is_empty());

        assert!(backend.create("a", b"1").unwrap());
        assert!(!backend.create("a", b"2").unwrap());
        assert_eq!(backend.read("a").unwrap(), b"1");
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_memory_backend_fail_writes() {
        let backend = MemoryBackend::new();
        backend.set_fail_writes(true);
        assert!(matches!(
            backend.create("a", b"1"),
            Err(SnapshotError::WriteFailed { .. })
        ));
        assert!(backend.is_empty());

        backend.set_fail_writes(false);
        assert!(backend.create("a", b"1").unwrap());
    }
}
