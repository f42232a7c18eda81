//! Package store naming conventions.
//!
//! This module is the single source of truth for where package files live
//! in the store:
//!
//! ```text
//! <root>/<name>/<version>/<name>-<version>.<ext>
//! ```
//!
//! The scanner, the extractor and the tests all build and parse paths through
//! these functions rather than formatting names themselves.

use std::path::{Path, PathBuf};

use super::{PackageKind, Version};

/// Name of the archive contents file kept at the store root.
///
/// It is never treated as a package candidate.
pub const INDEX_FILENAME: &str = "archive-contents";

/// Generate the file name of a package file.
///
/// # Examples
///
/// ```
/// use pkgarchive::package::{package_filename, PackageKind, Version};
///
/// assert_eq!(
///     package_filename("foo", &Version::from_slice(&[1, 2]), PackageKind::Single),
///     "foo-1.2.el"
/// );
/// assert_eq!(
///     package_filename("foo-mode", &Version::from_slice(&[3]), PackageKind::Archive),
///     "foo-mode-3.tar"
/// );
/// ```
pub fn package_filename(name: &str, version: &Version, kind: PackageKind) -> String {
    format!("{}-{}.{}", name, version, kind.extension())
}

/// Path of a package file relative to the store root.
pub fn package_relative_path(name: &str, version: &Version, kind: PackageKind) -> PathBuf {
    PathBuf::from(name)
        .join(version.to_string())
        .join(package_filename(name, version, kind))
}

/// Absolute path of a package file under `root`.
pub fn package_path(root: &Path, name: &str, version: &Version, kind: PackageKind) -> PathBuf {
    root.join(package_relative_path(name, version, kind))
}

/// Parse a package file name belonging to package `name`.
///
/// Package names may themselves contain dashes, so the name comes from the
/// enclosing directory and only the remainder is parsed. Returns `None` when
/// the file name does not have the `<name>-<version>.<ext>` shape or the
/// extension is not a known [`PackageKind`].
///
/// # Examples
///
/// ```
/// use pkgarchive::package::{parse_package_filename, PackageKind, Version};
///
/// let (version, kind) = parse_package_filename("foo-mode", "foo-mode-1.2.tar").unwrap();
/// assert_eq!(version, Version::from_slice(&[1, 2]));
/// assert_eq!(kind, PackageKind::Archive);
///
/// assert!(parse_package_filename("foo", "foo-1.2.zip").is_none());
/// assert!(parse_package_filename("foo", "bar-1.2.el").is_none());
/// ```
pub fn parse_package_filename(name: &str, file_name: &str) -> Option<(Version, PackageKind)> {
    let rest = file_name.strip_prefix(name)?.strip_prefix('-')?;
    let (version, ext) = rest.rsplit_once('.')?;
    let kind = PackageKind::from_extension(ext)?;
    let version = version.parse().ok()?;
    Some((version, kind))
}

/// Check whether `name` can name a package.
///
/// Any non-empty name except `nil` works; `nil` reads back as the empty list
/// in archive contents.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "nil"
}

/// Check whether a directory entry name is hidden (e.g. `.git`).
pub fn is_hidden(entry_name: &str) -> bool {
    entry_name.starts_with('.')
}
