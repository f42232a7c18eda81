//! Error types for metadata extraction.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for extraction.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Errors that can occur while extracting package metadata.
///
/// During a scan these drop the offending candidate; they never abort the
/// scan as a whole.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The package file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A required header is missing or malformed.
    #[error("missing or malformed {header} in {}", path.display())]
    MissingHeader { path: PathBuf, header: &'static str },

    /// The declared version does not parse.
    #[error("invalid version '{value}' in {}", path.display())]
    InvalidVersion { path: PathBuf, value: String },

    /// The requirements list does not parse.
    #[error("invalid requirements in {}: {reason}", path.display())]
    InvalidRequirements { path: PathBuf, reason: String },

    /// An archive has no `<name>-pkg.el` descriptor file.
    #[error("no {expected} found in archive {}", path.display())]
    MissingPackageFile { path: PathBuf, expected: String },

    /// The metadata names a different package than the store layout.
    #[error("package name mismatch in {}: expected '{expected}', found '{found}'", path.display())]
    NameMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    /// The extractor cannot handle this candidate.
    #[error("unsupported package file {}: {reason}", path.display())]
    Unsupported { path: PathBuf, reason: String },
}

impl ExtractionError {
    /// Path of the package file the error refers to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ExtractionError::Read { path, .. }
            | ExtractionError::MissingHeader { path, .. }
            | ExtractionError::InvalidVersion { path, .. }
            | ExtractionError::InvalidRequirements { path, .. }
            | ExtractionError::MissingPackageFile { path, .. }
            | ExtractionError::NameMismatch { path, .. }
            | ExtractionError::Unsupported { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_read_error_has_source() {
        let err = ExtractionError::Read {
            path: PathBuf::from("/store/foo/1/foo-1.el"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("foo-1.el"));
    }

    #[test]
    fn test_name_mismatch_display() {
        let err = ExtractionError::NameMismatch {
            path: PathBuf::from("x.tar"),
            expected: "foo".to_string(),
            found: "bar".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'foo'"));
        assert!(msg.contains("'bar'"));
        assert!(err.source().is_none());
    }

    #[test]
    fn test_path_accessor() {
        let err = ExtractionError::MissingHeader {
            path: PathBuf::from("/a/b.el"),
            header: "summary line",
        };
        assert_eq!(err.path(), std::path::Path::new("/a/b.el"));
    }
}
