//! Archive index and its on-disk contents format.
//!
//! - [`ArchiveIndex`] holds the best descriptor per package name and owns the
//!   version-dominance merge rule.
//! - [`contents`] encodes an index as archive contents text and back.
//! - [`build_index`] runs metadata extraction over scan candidates in
//!   parallel and merges the results.

pub mod contents;
mod build;
mod index;

pub use build::{build_index, merge_candidates, BuildStats};
pub use contents::{ContentsError, ContentsResult, FORMAT_VERSION};
pub use index::{ArchiveIndex, MergeOutcome, MergeStats};
