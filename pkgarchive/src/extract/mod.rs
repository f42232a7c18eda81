//! Package metadata extraction.
//!
//! A [`MetadataExtractor`] turns a scan [`Candidate`] into a
//! [`PackageDescriptor`]. The candidate's format was already decided by the
//! scanner from its extension, so extractors dispatch on
//! [`Candidate::format`](crate::scanner::Candidate) rather than sniffing
//! files.
//!
//! [`HeaderExtractor`] is the default implementation. Callers with their own
//! metadata source implement the trait and hand it to
//! [`ArchiveService`](crate::service::ArchiveService).

mod error;
mod header;

pub use error::{ExtractionError, ExtractionResult};
pub use header::HeaderExtractor;

use crate::package::PackageDescriptor;
use crate::scanner::Candidate;

/// Produces package metadata from a package file.
///
/// Implementations must be thread-safe: extraction runs in parallel across
/// candidates.
pub trait MetadataExtractor: Send + Sync {
    /// Extract the descriptor for `candidate`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError`] for unreadable files, malformed headers
    /// or unsupported formats.
    fn extract(&self, candidate: &Candidate) -> ExtractionResult<PackageDescriptor>;
}
