//! Package store discovery.
//!
//! The [`Scanner`] walks a package store laid out as
//! `<root>/<name>/<version>/<name>-<version>.<ext>` and yields one
//! [`Candidate`] per package file. Anything that does not fit the layout is
//! skipped and recorded as a [`ScanWarning`]; a single bad entry never fails
//! the scan.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::package::{
    is_hidden, is_valid_name, parse_package_filename, PackageKind, Version, INDEX_FILENAME,
};

/// A directory entry that could not be read.
#[derive(Debug, Error)]
#[error("failed to read {}: {source}", path.display())]
pub struct ScanError {
    /// Path that failed.
    pub path: PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: io::Error,
}

/// Something the scanner skipped.
#[derive(Debug)]
pub enum ScanWarning {
    /// A directory or entry could not be read.
    Unreadable(ScanError),

    /// An entry does not match the store layout.
    UnexpectedEntry { path: PathBuf, reason: &'static str },
}

impl ScanWarning {
    /// Path the warning refers to.
    pub fn path(&self) -> &Path {
        match self {
            ScanWarning::Unreadable(e) => &e.path,
            ScanWarning::UnexpectedEntry { path, .. } => path,
        }
    }
}

impl std::fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanWarning::Unreadable(e) => write!(f, "{}", e),
            ScanWarning::UnexpectedEntry { path, reason } => {
                write!(f, "skipped {}: {}", path.display(), reason)
            }
        }
    }
}

/// A package file found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Package name (the top-level directory).
    pub name: String,

    /// Version taken from the directory and file name.
    pub version: Version,

    /// Format detected from the file extension.
    pub format: PackageKind,

    /// Absolute path to the file.
    pub path: PathBuf,
}

/// Result of scanning a package store.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Candidates sorted by path.
    pub candidates: Vec<Candidate>,

    /// Entries that were skipped.
    pub warnings: Vec<ScanWarning>,
}

/// Walks a package store for candidate package files.
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
}

impl Scanner {
    /// Create a scanner for the store at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the whole store.
    pub fn scan_all(&self) -> ScanReport {
        self.scan(None)
    }

    /// Scan only the given package names.
    pub fn scan_names(&self, names: &[String]) -> ScanReport {
        self.scan(Some(names))
    }

    /// Scan the store, optionally restricted to a set of package names.
    ///
    /// A missing root produces an empty report.
    pub fn scan(&self, filter: Option<&[String]>) -> ScanReport {
        let mut report = ScanReport::default();

        if !self.root.is_dir() {
            tracing::debug!(root = %self.root.display(), "Package store does not exist");
            return report;
        }

        for (name, path) in self.read_children(&self.root, &mut report) {
            if is_hidden(&name) {
                continue;
            }
            if !path.is_dir() {
                // Contents files, snapshots and any loose files live at the root.
                if !name.starts_with(INDEX_FILENAME) {
                    tracing::debug!(path = %path.display(), "Ignoring loose file in store root");
                }
                continue;
            }
            if let Some(names) = filter {
                if !names.iter().any(|n| n == &name) {
                    continue;
                }
            }
            if !is_valid_name(&name) {
                report.warnings.push(ScanWarning::UnexpectedEntry {
                    path,
                    reason: "directory name is not a usable package name",
                });
                continue;
            }
            self.scan_package_dir(&name, &path, &mut report);
        }

        report.candidates.sort_by(|a, b| a.path.cmp(&b.path));

        for warning in &report.warnings {
            tracing::warn!(path = %warning.path().display(), "{}", warning);
        }
        tracing::debug!(
            candidates = report.candidates.len(),
            skipped = report.warnings.len(),
            "Package store scan complete"
        );

        report
    }

    fn scan_package_dir(&self, name: &str, dir: &Path, report: &mut ScanReport) {
        for (entry_name, path) in self.read_children(dir, report) {
            if is_hidden(&entry_name) {
                continue;
            }
            if !path.is_dir() {
                report.warnings.push(ScanWarning::UnexpectedEntry {
                    path,
                    reason: "expected a version directory",
                });
                continue;
            }
            let Ok(version) = entry_name.parse::<Version>() else {
                report.warnings.push(ScanWarning::UnexpectedEntry {
                    path,
                    reason: "directory name is not a version",
                });
                continue;
            };
            self.scan_version_dir(name, &version, &path, report);
        }
    }

    fn scan_version_dir(&self, name: &str, version: &Version, dir: &Path, report: &mut ScanReport) {
        for (file_name, path) in self.read_children(dir, report) {
            if is_hidden(&file_name) {
                continue;
            }
            if !path.is_file() {
                report.warnings.push(ScanWarning::UnexpectedEntry {
                    path,
                    reason: "expected a package file",
                });
                continue;
            }
            match parse_package_filename(name, &file_name) {
                Some((file_version, format)) if file_version == *version => {
                    report.candidates.push(Candidate {
                        name: name.to_string(),
                        version: version.clone(),
                        format,
                        path,
                    });
                }
                Some(_) => report.warnings.push(ScanWarning::UnexpectedEntry {
                    path,
                    reason: "file version does not match its directory",
                }),
                None => report.warnings.push(ScanWarning::UnexpectedEntry {
                    path,
                    reason: "not a <name>-<version>.<ext> package file",
                }),
            }
        }
    }

    /// List a directory as (name, path) pairs, recording unreadable entries.
    fn read_children(&self, dir: &Path, report: &mut ScanReport) -> Vec<(String, PathBuf)> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(source) => {
                report.warnings.push(ScanWarning::Unreadable(ScanError {
                    path: dir.to_path_buf(),
                    source,
                }));
                return Vec::new();
            }
        };

        let mut children = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => {
                    let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                        report.warnings.push(ScanWarning::UnexpectedEntry {
                            path: entry.path(),
                            reason: "file name is not valid UTF-8",
                        });
                        continue;
                    };
                    children.push((name, entry.path()));
                }
                Err(source) => report.warnings.push(ScanWarning::Unreadable(ScanError {
                    path: dir.to_path_buf(),
                    source,
                })),
            }
        }
        children.sort();
        children
    }
}
